//! Dictionaries and the dictionary stack.
//!
//! A dictionary is an open-addressed hash table keyed on interned-name
//! identity: the name handle's address seeds the probe, slots are probed
//! linearly, and the table rehash-doubles before the load factor reaches
//! 3/4. Removal tombstones the slot so later probes keep walking.

use std::{cell::RefCell, rc::Rc};

use crate::{
    error::{PostScriptError, PsResult},
    name::Name,
    object::{Access, Object},
};

const INITIAL_SLOTS: usize = 8;

#[derive(Debug, Clone)]
enum Slot {
    Empty,
    /// Tombstone left behind by `remove`
    Reserved,
    Occupied { key: Name, value: Object },
}

#[derive(Debug, Clone)]
pub struct Dictionary {
    slots: Vec<Slot>,
    count: usize,
    access: Access,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_SLOTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let slots = capacity.next_power_of_two().max(INITIAL_SLOTS);

        Self {
            slots: vec![Slot::Empty; slots],
            count: 0,
            access: Access::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Current slot capacity; what `maxlength` reports
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn set_access(&mut self, access: Access) {
        self.access = access;
    }

    /// The name handle doubles as its own hash key
    fn home_slot(&self, key: Name) -> usize {
        let hash = key.as_bytes().as_ptr() as usize;
        // drop the low bits: interned allocations are aligned
        (hash >> 3) & (self.slots.len() - 1)
    }

    pub fn get(&self, key: Name) -> Option<&Object> {
        let mut idx = self.home_slot(key);

        for _ in 0..self.slots.len() {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Reserved => {}
                Slot::Occupied { key: k, value } if *k == key => return Some(value),
                Slot::Occupied { .. } => {}
            }

            idx = (idx + 1) & (self.slots.len() - 1);
        }

        None
    }

    pub fn contains(&self, key: Name) -> bool {
        self.get(key).is_some()
    }

    /// Insert-or-update
    pub fn insert(&mut self, key: Name, value: Object) {
        if self.count + 1 >= self.slots.len() * 3 / 4 {
            self.grow();
        }

        let mut idx = self.home_slot(key);

        loop {
            match &self.slots[idx] {
                Slot::Occupied { key: k, .. } if *k == key => {
                    self.slots[idx] = Slot::Occupied { key, value };
                    return;
                }
                Slot::Empty | Slot::Reserved => {
                    self.slots[idx] = Slot::Occupied { key, value };
                    self.count += 1;
                    return;
                }
                Slot::Occupied { .. } => {}
            }

            idx = (idx + 1) & (self.slots.len() - 1);
        }
    }

    pub fn remove(&mut self, key: Name) -> Option<Object> {
        let mut idx = self.home_slot(key);

        for _ in 0..self.slots.len() {
            match &self.slots[idx] {
                Slot::Empty => return None,
                Slot::Occupied { key: k, .. } if *k == key => {
                    let old = std::mem::replace(&mut self.slots[idx], Slot::Reserved);
                    self.count -= 1;

                    return match old {
                        Slot::Occupied { value, .. } => Some(value),
                        _ => unreachable!(),
                    };
                }
                Slot::Reserved | Slot::Occupied { .. } => {}
            }

            idx = (idx + 1) & (self.slots.len() - 1);
        }

        None
    }

    fn grow(&mut self) {
        let doubled = self.slots.len() * 2;
        let old = std::mem::replace(&mut self.slots, vec![Slot::Empty; doubled]);
        self.count = 0;

        for slot in old {
            if let Slot::Occupied { key, value } = slot {
                self.insert(key, value);
            }
        }
    }

    /// Visits occupied slots in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (Name, &Object)> {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Occupied { key, value } => Some((*key, value)),
            _ => None,
        })
    }

    pub fn entries(&self) -> Vec<(Name, Object)> {
        self.iter().map(|(k, v)| (k, v.clone())).collect()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}

pub type DictRef = Rc<RefCell<Dictionary>>;

pub fn new_dict_ref(dict: Dictionary) -> DictRef {
    Rc::new(RefCell::new(dict))
}

/// The dictionary stack: name lookup searches top-down, `begin`/`end` push
/// and pop, and the bottommost entries (systemdict, userdict) are permanent.
#[derive(Debug, Clone)]
pub struct DictStack {
    stack: Vec<DictRef>,
    permanent: usize,
}

impl DictStack {
    pub fn new(system_dict: DictRef, user_dict: DictRef) -> Self {
        Self {
            stack: vec![system_dict, user_dict],
            permanent: 2,
        }
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn system_dict(&self) -> DictRef {
        Rc::clone(&self.stack[0])
    }

    pub fn current(&self) -> DictRef {
        Rc::clone(self.stack.last().unwrap())
    }

    pub fn begin(&mut self, dict: DictRef) {
        self.stack.push(dict);
    }

    pub fn end(&mut self) -> PsResult<()> {
        if self.stack.len() <= self.permanent {
            anyhow::bail!(PostScriptError::DictStackUnderflow);
        }

        self.stack.pop();

        Ok(())
    }

    /// Write into the current dictionary
    pub fn def(&mut self, key: Name, value: Object) {
        self.current().borrow_mut().insert(key, value);
    }

    /// Update the first dictionary that contains `key`, else def into the top
    pub fn store(&mut self, key: Name, value: Object) {
        for dict in self.stack.iter().rev() {
            if dict.borrow().contains(key) {
                dict.borrow_mut().insert(key, value);
                return;
            }
        }

        self.def(key, value);
    }

    pub fn load(&self, key: Name) -> PsResult<Object> {
        match self.lookup(key) {
            Some(obj) => Ok(obj),
            None => anyhow::bail!(PostScriptError::Undefined { key }),
        }
    }

    pub fn lookup(&self, key: Name) -> Option<Object> {
        for dict in self.stack.iter().rev() {
            if let Some(obj) = dict.borrow().get(key) {
                return Some(obj.clone());
            }
        }

        None
    }

    /// The defining dictionary, for `where`
    pub fn where_defined(&self, key: Name) -> Option<DictRef> {
        self.stack
            .iter()
            .rev()
            .find(|dict| dict.borrow().contains(key))
            .map(Rc::clone)
    }

    /// Pop back down to the permanent entries
    pub fn clear_to_permanent(&mut self) {
        self.stack.truncate(self.permanent);
    }

    /// Roll back to a depth captured by `save`; never pops permanent entries
    pub fn truncate(&mut self, depth: usize) {
        self.stack.truncate(depth.max(self.permanent));
    }

    pub fn snapshot(&self) -> Vec<DictRef> {
        self.stack.clone()
    }
}
