//! The resource subsystem: a stack of dictionaries, each mapping a category
//! name (`Font`, `Pattern`, …) to a dictionary of instances.

use std::rc::Rc;

use crate::{
    dictionary::{new_dict_ref, DictRef, Dictionary},
    error::{PostScriptError, PsResult},
    name::Name,
    object::{Object, Value},
};

#[derive(Debug)]
pub struct ResourceStack {
    stack: Vec<DictRef>,
}

impl ResourceStack {
    pub fn new() -> Self {
        Self {
            stack: vec![new_dict_ref(Dictionary::new())],
        }
    }

    fn category_dict(dir: &DictRef, category: Name) -> Option<DictRef> {
        match dir.borrow().get(category) {
            Some(Object {
                value: Value::Dictionary(dict),
                ..
            }) => Some(Rc::clone(dict)),
            _ => None,
        }
    }

    /// Search top-down for an instance
    pub fn find(&self, category: Name, key: Name) -> Option<Object> {
        for dir in self.stack.iter().rev() {
            if let Some(instances) = Self::category_dict(dir, category) {
                if let Some(obj) = instances.borrow().get(key) {
                    return Some(obj.clone());
                }
            }
        }

        None
    }

    /// Register into the topmost directory, creating the category on demand
    pub fn define(&mut self, category: Name, key: Name, value: Object) {
        let top = self.stack.last().unwrap();

        let instances = match Self::category_dict(top, category) {
            Some(dict) => dict,
            None => {
                let dict = new_dict_ref(Dictionary::new());
                top.borrow_mut()
                    .insert(category, Object::dictionary(Rc::clone(&dict)));
                dict
            }
        };

        instances.borrow_mut().insert(key, value);
    }

    pub fn undefine(&mut self, category: Name, key: Name) -> PsResult<()> {
        let top = self.stack.last().unwrap();

        let instances = match Self::category_dict(top, category) {
            Some(dict) => dict,
            None => anyhow::bail!(PostScriptError::Undefined { key: category }),
        };

        if instances.borrow_mut().remove(key).is_none() {
            anyhow::bail!(PostScriptError::Undefined { key });
        }

        Ok(())
    }

    pub fn status(&self, category: Name, key: Name) -> bool {
        self.find(category, key).is_some()
    }

    /// Every instance of the category across the stack, top-down, first
    /// definition wins
    pub fn all_instances(&self, category: Name) -> Vec<(Name, Object)> {
        let mut seen = Vec::new();
        let mut out = Vec::new();

        for dir in self.stack.iter().rev() {
            if let Some(instances) = Self::category_dict(dir, category) {
                for (key, value) in instances.borrow().iter() {
                    if !seen.contains(&key) {
                        seen.push(key);
                        out.push((key, value.clone()));
                    }
                }
            }
        }

        out
    }
}

impl Default for ResourceStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn name(s: &[u8]) -> Name {
        Name::new(s)
    }

    #[test]
    fn define_then_find() {
        let mut resources = ResourceStack::new();

        resources.define(name(b"Font"), name(b"Helvetica"), Object::integer(1));

        assert!(resources
            .find(name(b"Font"), name(b"Helvetica"))
            .unwrap()
            .ps_eq(&Object::integer(1)));
        assert!(resources.status(name(b"Font"), name(b"Helvetica")));
        assert!(!resources.status(name(b"Font"), name(b"Courier")));
    }

    #[test]
    fn undefine_removes() {
        let mut resources = ResourceStack::new();

        resources.define(name(b"Font"), name(b"X"), Object::integer(1));
        resources.undefine(name(b"Font"), name(b"X")).unwrap();

        assert!(resources.find(name(b"Font"), name(b"X")).is_none());
        assert!(resources.undefine(name(b"Font"), name(b"X")).is_err());
    }

    #[test]
    fn all_instances_enumerates() {
        let mut resources = ResourceStack::new();

        resources.define(name(b"Pattern"), name(b"a"), Object::integer(1));
        resources.define(name(b"Pattern"), name(b"b"), Object::integer(2));

        let all = resources.all_instances(name(b"Pattern"));
        assert_eq!(all.len(), 2);
    }
}
