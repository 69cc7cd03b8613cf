//! Most-recently-used tab ordering.

use crate::host::TabId;

/// Duplicate-free list of tabs, most recent first.
///
/// Order only changes through [`push_back`](Self::push_back),
/// [`push_front`](Self::push_front) and [`move_to_front`](Self::move_to_front).
/// Removal never reorders the remaining entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MruList {
	items: Vec<TabId>,
}

impl MruList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn at(&self, index: usize) -> Option<TabId> {
		self.items.get(index).copied()
	}

	pub fn index_of(&self, id: TabId) -> Option<usize> {
		self.items.iter().position(|&t| t == id)
	}

	pub fn contains(&self, id: TabId) -> bool {
		self.index_of(id).is_some()
	}

	pub fn iter(&self) -> impl DoubleEndedIterator<Item = TabId> + '_ {
		self.items.iter().copied()
	}

	pub fn to_vec(&self) -> Vec<TabId> {
		self.items.clone()
	}

	/// Appends `id` as least recent. Returns `false` if it was already tracked.
	pub fn push_back(&mut self, id: TabId) -> bool {
		if self.contains(id) {
			return false;
		}
		self.items.push(id);
		true
	}

	/// Inserts `id` as most recent. Returns `false` if it was already tracked.
	pub fn push_front(&mut self, id: TabId) -> bool {
		if self.contains(id) {
			return false;
		}
		self.items.insert(0, id);
		true
	}

	/// Moves a tracked tab to index 0, keeping everything else in order.
	///
	/// Returns `false` (and does nothing) if `id` is not tracked.
	pub fn move_to_front(&mut self, id: TabId) -> bool {
		match self.index_of(id) {
			Some(index) => {
				self.items[..=index].rotate_right(1);
				true
			}
			None => false,
		}
	}

	/// Removes `id` if tracked, returning its former index.
	pub fn remove(&mut self, id: TabId) -> Option<usize> {
		let index = self.index_of(id)?;
		self.items.remove(index);
		Some(index)
	}

	/// Removes the entry at `index`. Out-of-range indices are a no-op.
	pub fn remove_at(&mut self, index: usize) -> Option<TabId> {
		(index < self.items.len()).then(|| self.items.remove(index))
	}

	pub fn clear(&mut self) {
		self.items.clear();
	}
}

impl FromIterator<TabId> for MruList {
	/// Collects tabs in order, skipping duplicates.
	fn from_iter<I: IntoIterator<Item = TabId>>(iter: I) -> Self {
		let mut list = MruList::new();
		for id in iter {
			list.push_back(id);
		}
		list
	}
}
