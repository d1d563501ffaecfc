//! In-memory state containers, one per entity.
//!
//! A `Collection` holds the last fetched list, the record currently being
//! viewed, and the loading/error flags of the request in progress. It is
//! mutated only when a request completes; nothing here talks to the network.
//! The `loaded` flag lets callers skip a refetch unless they force one, and is
//! cleared on logout or when a related mutation makes the list stale.

use crate::types::{Book, Category, Loan, Resource, User};

#[derive(Debug, Clone)]
pub struct Collection<R> {
    items: Vec<R>,
    current: Option<R>,
    loading: bool,
    error: Option<String>,
    loaded: bool,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            current: None,
            loading: false,
            error: None,
            loaded: false,
        }
    }
}

impl<R: Resource> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn current(&self) -> Option<&R> {
        self.current.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether the full list has been fetched since the last invalidation.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn find(&self, id: &str) -> Option<&R> {
        self.items.iter().find(|r| r.id() == Some(id))
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut R> {
        self.items.iter_mut().find(|r| r.id() == Some(id))
    }

    pub fn begin(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    /// End a request that changes none of the cached data.
    pub fn finish(&mut self) {
        self.loading = false;
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn select(&mut self, record: Option<R>) {
        self.current = record;
    }

    /// A complete list. Only complete lists mark the collection loaded;
    /// filtered views (search results, per-user loans) go through
    /// `set_filtered`.
    pub fn set_all(&mut self, items: Vec<R>) {
        self.loading = false;
        self.items = items;
        self.loaded = true;
    }

    pub fn set_filtered(&mut self, items: Vec<R>) {
        self.loading = false;
        self.items = items;
        self.loaded = false;
    }

    pub fn set_current(&mut self, record: R) {
        self.loading = false;
        self.current = Some(record);
    }

    pub fn insert(&mut self, record: R) {
        self.loading = false;
        self.items.push(record);
    }

    /// Swap in the server's version of a record, matched by id, and make it
    /// the current record.
    pub fn replace(&mut self, record: R) {
        self.loading = false;
        if let Some(id) = record.id() {
            if let Some(slot) = self.items.iter_mut().find(|r| r.id() == Some(id)) {
                *slot = record.clone();
            }
        }
        self.current = Some(record);
    }

    pub fn remove(&mut self, id: &str) {
        self.loading = false;
        self.items.retain(|r| r.id() != Some(id));
        if self.current.as_ref().and_then(|r| r.id()) == Some(id) {
            self.current = None;
        }
    }

    /// Keep the data but force the next fetch to hit the server.
    pub fn mark_stale(&mut self) {
        self.loaded = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One collection per entity.
#[derive(Debug, Clone, Default)]
pub struct Stores {
    pub books: Collection<Book>,
    pub categories: Collection<Category>,
    pub users: Collection<User>,
    pub loans: Collection<Loan>,
}

impl Stores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of<R: Stored>(&self) -> &Collection<R> {
        R::collection(self)
    }

    pub fn of_mut<R: Stored>(&mut self) -> &mut Collection<R> {
        R::collection_mut(self)
    }

    pub fn reset_all(&mut self) {
        self.books.reset();
        self.categories.reset();
        self.users.reset();
        self.loans.reset();
    }
}

/// A resource with a home in `Stores`.
pub trait Stored: Resource {
    fn collection(stores: &Stores) -> &Collection<Self>;
    fn collection_mut(stores: &mut Stores) -> &mut Collection<Self>;
}

macro_rules! stored {
    ($ty:ty, $field:ident) => {
        impl Stored for $ty {
            fn collection(stores: &Stores) -> &Collection<Self> {
                &stores.$field
            }

            fn collection_mut(stores: &mut Stores) -> &mut Collection<Self> {
                &mut stores.$field
            }
        }
    };
}

stored!(Book, books);
stored!(Category, categories);
stored!(User, users);
stored!(Loan, loans);
