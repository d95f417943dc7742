//! The cart store.
//!
//! This holds what the user intends to order before submission. Entries are
//! merged by identity (product + modifier combination) so the same burger with
//! the same add-ons never shows up twice. Every mutation writes the full cart
//! snapshot through the injected [`CartStorage`], and a new store starts from
//! whatever snapshot is already persisted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::api::CartItemPayload;
use crate::errors::Result;
use crate::pricing::{self, Drink};

/// One entry of the cart
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub product_id: String,
    pub name: String,
    /// Display price only. The server re-resolves prices for catalog items;
    /// for bundles this is the agreed fixed price.
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub drink: Option<Drink>,
    #[serde(default)]
    pub extra_cheese: bool,
    #[serde(default)]
    pub is_bundle: bool,
}

impl LineItem {
    /// Two line items with the same identity must be merged, never duplicated
    fn same_identity(&self, product_id: &str, drink: Option<Drink>, extra_cheese: bool) -> bool {
        self.product_id == product_id && self.drink == drink && self.extra_cheese == extra_cheese
    }

    /// Price of this line as shown to the user, from the shared pricing rules
    pub fn display_total(&self) -> Decimal {
        pricing::line_total(self.unit_price, self.drink, self.extra_cheese, self.quantity)
    }
}

/// Trait hiding where the cart snapshot lives.
///
/// The store itself does not care whether this is a file, memory, or anything
/// else; it loads once on construction and saves after every mutation.
pub trait CartStorage {
    /// Read the persisted snapshot. An absent snapshot is an empty cart.
    fn load(&self) -> Result<Vec<LineItem>>;

    /// Overwrite the persisted snapshot with the given cart
    fn save(&mut self, items: &[LineItem]) -> Result<()>;
}

/// The cart store proper. Single writer per session.
pub struct CartStore<S: CartStorage> {
    items: Vec<LineItem>,
    storage: S,
}

impl<S: CartStorage> CartStore<S> {
    /// Create a store, initialising from the persisted snapshot if present
    pub fn new(storage: S) -> Result<Self> {
        let items = storage.load()?;
        Ok(CartStore { items, storage })
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item to the cart.
    ///
    /// If an entry with the same identity already exists, its quantity grows
    /// by the added quantity; otherwise the item is appended as-is. A zero
    /// quantity on the input is treated as 1.
    pub fn add(&mut self, mut item: LineItem) -> Result<()> {
        if item.quantity < 1 {
            item.quantity = 1;
        }
        match self.find_mut(&item.product_id, item.drink, item.extra_cheese) {
            Some(existing) => existing.quantity += item.quantity,
            None => self.items.push(item),
        }
        self.persist()
    }

    /// Remove one unit of the matching entry.
    ///
    /// At quantity 1 the entry disappears entirely. When nothing matches this
    /// is a no-op (the snapshot is not rewritten).
    pub fn remove_one(
        &mut self,
        product_id: &str,
        drink: Option<Drink>,
        extra_cheese: bool,
    ) -> Result<()> {
        let Some(pos) = self
            .items
            .iter()
            .position(|i| i.same_identity(product_id, drink, extra_cheese))
        else {
            return Ok(());
        };
        if self.items[pos].quantity > 1 {
            self.items[pos].quantity -= 1;
        } else {
            self.items.remove(pos);
        }
        self.persist()
    }

    /// Overwrite the quantity of the matching entry.
    ///
    /// Quantities below 1 are coerced to 1; unlike [`CartStore::remove_one`]
    /// this path never deletes an entry. Returns whether an entry was updated.
    /// Setting the quantity of an absent entry does nothing: creating an entry
    /// needs full product data and goes through [`CartStore::add`].
    pub fn set_quantity(
        &mut self,
        product_id: &str,
        quantity: u32,
        drink: Option<Drink>,
        extra_cheese: bool,
    ) -> Result<bool> {
        let quantity = quantity.max(1);
        match self.find_mut(product_id, drink, extra_cheese) {
            Some(existing) => {
                existing.quantity = quantity;
                self.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Empty the cart unconditionally
    pub fn clear(&mut self) -> Result<()> {
        self.items.clear();
        self.persist()
    }

    /// Display total over all lines, from the shared pricing rules
    pub fn display_total(&self) -> Decimal {
        pricing::order_total(self.items.iter().map(LineItem::display_total))
    }

    /// Convert the cart into the submission payload.
    ///
    /// Bundles embed their name and fixed price; catalog items carry their
    /// advisory price, which the server ignores in favour of the catalog.
    pub fn to_payload(&self) -> Vec<CartItemPayload> {
        self.items
            .iter()
            .map(|item| CartItemPayload {
                restaurant_id: Some(item.product_id.clone()),
                quantity: Some(item.quantity),
                drink: item.drink,
                extra_cheese: Some(item.extra_cheese),
                is_deal: Some(item.is_bundle),
                name: item.is_bundle.then(|| item.name.clone()),
                price: Some(item.unit_price),
            })
            .collect()
    }

    fn find_mut(
        &mut self,
        product_id: &str,
        drink: Option<Drink>,
        extra_cheese: bool,
    ) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|i| i.same_identity(product_id, drink, extra_cheese))
    }

    fn persist(&mut self) -> Result<()> {
        self.storage.save(&self.items)
    }
}

/// Snapshot storage backed by a JSON file at a fixed path
pub struct FileCartStorage {
    path: std::path::PathBuf,
}

impl FileCartStorage {
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        FileCartStorage { path: path.into() }
    }
}

impl CartStorage for FileCartStorage {
    fn load(&self) -> Result<Vec<LineItem>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, items: &[LineItem]) -> Result<()> {
        let json = serde_json::to_string(items)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

/// In-memory snapshot storage, for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryCartStorage {
    snapshot: Vec<LineItem>,
}

impl CartStorage for MemoryCartStorage {
    fn load(&self) -> Result<Vec<LineItem>> {
        Ok(self.snapshot.clone())
    }

    fn save(&mut self, items: &[LineItem]) -> Result<()> {
        self.snapshot = items.to_vec();
        Ok(())
    }
}
