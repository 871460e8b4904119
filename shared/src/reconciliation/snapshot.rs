//! Read-only inventory snapshot a report run computes over

use std::collections::HashMap;

use uuid::Uuid;

use crate::error::{ReconciliationError, ReconciliationResult};
use crate::models::{Bottle, Branch, Ingredient, InspectionItem, PosConsumption, Product};
use crate::validation::validate_bottle_lifecycle;

/// Consistent view of one branch's bottles, history, catalog and POS data
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub branch: Branch,
    pub ingredients: HashMap<Uuid, Ingredient>,
    pub products: HashMap<Uuid, Product>,
    pub bottles: Vec<Bottle>,
    /// Inspection items keyed by bottle id
    pub inspection_items: HashMap<Uuid, Vec<InspectionItem>>,
    pub pos_consumption: Vec<PosConsumption>,
}

impl InventorySnapshot {
    pub fn new(branch: Branch) -> Self {
        Self {
            branch,
            ingredients: HashMap::new(),
            products: HashMap::new(),
            bottles: Vec::new(),
            inspection_items: HashMap::new(),
            pos_consumption: Vec::new(),
        }
    }

    pub fn with_ingredient(mut self, ingredient: Ingredient) -> Self {
        self.ingredients.insert(ingredient.id, ingredient);
        self
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.id, product);
        self
    }

    pub fn with_bottle(mut self, bottle: Bottle) -> Self {
        self.bottles.push(bottle);
        self
    }

    pub fn with_inspection_item(mut self, item: InspectionItem) -> Self {
        self.inspection_items
            .entry(item.bottle_id)
            .or_default()
            .push(item);
        self
    }

    pub fn with_pos_consumption(mut self, pos: PosConsumption) -> Self {
        self.pos_consumption.push(pos);
        self
    }

    pub fn product(&self, id: Uuid) -> ReconciliationResult<&Product> {
        self.products
            .get(&id)
            .ok_or(ReconciliationError::UnknownProduct(id))
    }

    pub fn ingredient(&self, id: Uuid) -> ReconciliationResult<&Ingredient> {
        self.ingredients
            .get(&id)
            .ok_or(ReconciliationError::UnknownIngredient(id))
    }

    /// Full inspection history of a bottle (empty when never inspected)
    pub fn items_for(&self, bottle_id: Uuid) -> &[InspectionItem] {
        self.inspection_items
            .get(&bottle_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Bottles breaking lifecycle invariants, with the reason
    pub fn lifecycle_violations(&self) -> Vec<(Uuid, &'static str)> {
        self.bottles
            .iter()
            .filter_map(|bottle| {
                validate_bottle_lifecycle(bottle)
                    .err()
                    .map(|reason| (bottle.id, reason))
            })
            .collect()
    }
}
