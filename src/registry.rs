/// Name-keyed registrations in insertion order.
///
/// Registering an existing name overwrites the entry in place, keeping its
/// original position.
#[derive(Clone, Debug)]
pub(crate) struct Registry<T> {
    entries: Vec<(String, T)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }
}

impl<T: Clone> Registry<T> {
    pub(crate) fn insert(&mut self, name: String, value: T) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((name, value)),
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub(crate) fn entries(&self) -> Vec<(String, T)> {
        self.entries.clone()
    }

    pub(crate) fn values(&self) -> Vec<T> {
        self.entries.iter().map(|(_, value)| value.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
