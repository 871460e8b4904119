//! Loads a consistent inventory snapshot for one branch and window

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::reconciliation::InventorySnapshot;
use shared::{
    Bottle, BottleState, Branch, DateRange, Ingredient, InspectionItem, PosConsumption, Product,
};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Reads branches, catalog, bottles, inspections and POS aggregates
#[derive(Clone)]
pub struct SnapshotLoader {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct BranchRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct BottleRow {
    id: Uuid,
    product_id: Uuid,
    folio: Option<String>,
    capacity_ml: i32,
    crystal_weight: Decimal,
    initial_weight: Decimal,
    current_weight: Decimal,
    registered_at: NaiveDate,
    removed_at: Option<NaiveDate>,
    state: String,
}

impl TryFrom<BottleRow> for Bottle {
    type Error = AppError;

    fn try_from(row: BottleRow) -> Result<Self, Self::Error> {
        let state = BottleState::from_str(&row.state).ok_or_else(|| {
            AppError::Internal(format!("Bottle {} has unknown state {}", row.id, row.state))
        })?;

        Ok(Bottle {
            id: row.id,
            product_id: row.product_id,
            folio: row.folio,
            capacity_ml: row.capacity_ml,
            crystal_weight: row.crystal_weight,
            initial_weight: row.initial_weight,
            current_weight: row.current_weight,
            registered_at: row.registered_at,
            removed_at: row.removed_at,
            state,
        })
    }
}

#[derive(Debug, FromRow)]
struct InspectionItemRow {
    id: Uuid,
    inspection_id: Uuid,
    bottle_id: Uuid,
    measured_weight: Option<Decimal>,
    measured_at: DateTime<Utc>,
}

impl From<InspectionItemRow> for InspectionItem {
    fn from(row: InspectionItemRow) -> Self {
        InspectionItem {
            id: row.id,
            inspection_id: row.inspection_id,
            bottle_id: row.bottle_id,
            measured_weight: row.measured_weight,
            measured_at: row.measured_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
    ingredient_id: Uuid,
    capacity_ml: Option<i32>,
    unit_price: Option<Decimal>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            ingredient_id: row.ingredient_id,
            capacity_ml: row.capacity_ml,
            unit_price: row.unit_price,
        }
    }
}

#[derive(Debug, FromRow)]
struct IngredientRow {
    id: Uuid,
    name: String,
    category: String,
    density_factor: Option<Decimal>,
}

impl From<IngredientRow> for Ingredient {
    fn from(row: IngredientRow) -> Self {
        Ingredient {
            id: row.id,
            name: row.name,
            category: row.category,
            density_factor: row.density_factor,
        }
    }
}

#[derive(Debug, FromRow)]
struct PosRow {
    ingredient_id: Uuid,
    period_start: NaiveDate,
    period_end: NaiveDate,
    consumed_ml: Decimal,
}

impl From<PosRow> for PosConsumption {
    fn from(row: PosRow) -> Self {
        PosConsumption {
            ingredient_id: row.ingredient_id,
            period: DateRange::new(row.period_start, row.period_end),
            consumed_ml: row.consumed_ml,
        }
    }
}

impl SnapshotLoader {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Load everything a report over `window` needs.
    ///
    /// All reads share one repeatable-read transaction so a report never
    /// mixes rows from before and after a concurrent write. Inspection
    /// history is loaded in full since the starting-weight rules look at
    /// readings outside the window too.
    pub async fn load(
        &self,
        branch_id: Uuid,
        window: &DateRange,
        extra_ingredient: Option<Uuid>,
    ) -> AppResult<InventorySnapshot> {
        let mut tx = self.db.begin().await?;

        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;

        let branch = sqlx::query_as::<_, BranchRow>(
            r#"
            SELECT id, name
            FROM branches
            WHERE id = $1
            "#,
        )
        .bind(branch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Branch".to_string()))?;

        let bottles = load_bottles(&mut tx, branch_id, window).await?;
        let bottle_ids: Vec<Uuid> = bottles.iter().map(|b| b.id).collect();
        let product_ids: Vec<Uuid> = bottles
            .iter()
            .map(|b| b.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let items = sqlx::query_as::<_, InspectionItemRow>(
            r#"
            SELECT id, inspection_id, bottle_id, measured_weight, measured_at
            FROM inspection_items
            WHERE bottle_id = ANY($1)
            ORDER BY measured_at, id
            "#,
        )
        .bind(&bottle_ids)
        .fetch_all(&mut *tx)
        .await?;

        let products = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, ingredient_id, capacity_ml, unit_price
            FROM products
            WHERE id = ANY($1)
            "#,
        )
        .bind(&product_ids)
        .fetch_all(&mut *tx)
        .await?;

        let pos_rows = sqlx::query_as::<_, PosRow>(
            r#"
            SELECT ingredient_id, period_start, period_end, consumed_ml
            FROM pos_consumption
            WHERE branch_id = $1 AND period_start >= $2 AND period_end <= $3
            ORDER BY period_start, ingredient_id
            "#,
        )
        .bind(branch_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&mut *tx)
        .await?;

        let ingredient_ids: Vec<Uuid> = products
            .iter()
            .map(|p| p.ingredient_id)
            .chain(pos_rows.iter().map(|p| p.ingredient_id))
            .chain(extra_ingredient)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let ingredients = sqlx::query_as::<_, IngredientRow>(
            r#"
            SELECT id, name, category, density_factor
            FROM ingredients
            WHERE id = ANY($1)
            "#,
        )
        .bind(&ingredient_ids)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!(
            branch_id = %branch_id,
            bottles = bottles.len(),
            inspection_items = items.len(),
            products = products.len(),
            ingredients = ingredients.len(),
            pos_rows = pos_rows.len(),
            "Loaded inventory snapshot"
        );

        let mut snapshot = InventorySnapshot::new(Branch {
            id: branch.id,
            name: branch.name,
        });
        for ingredient in ingredients {
            snapshot = snapshot.with_ingredient(ingredient.into());
        }
        for product in products {
            snapshot = snapshot.with_product(product.into());
        }
        for bottle in bottles {
            snapshot = snapshot.with_bottle(bottle);
        }
        for item in items {
            snapshot = snapshot.with_inspection_item(item.into());
        }
        for pos in pos_rows {
            snapshot = snapshot.with_pos_consumption(pos.into());
        }

        Ok(snapshot)
    }
}

/// Bottles registered by the end of the window and not removed before its start
async fn load_bottles(
    tx: &mut Transaction<'_, Postgres>,
    branch_id: Uuid,
    window: &DateRange,
) -> AppResult<Vec<Bottle>> {
    let rows = sqlx::query_as::<_, BottleRow>(
        r#"
        SELECT id, product_id, folio, capacity_ml, crystal_weight, initial_weight,
               current_weight, registered_at, removed_at, state
        FROM bottles
        WHERE branch_id = $1
          AND registered_at <= $3
          AND (removed_at IS NULL OR removed_at >= $2)
        ORDER BY registered_at, id
        "#,
    )
    .bind(branch_id)
    .bind(window.start)
    .bind(window.end)
    .fetch_all(&mut **tx)
    .await?;

    rows.into_iter().map(Bottle::try_from).collect()
}
