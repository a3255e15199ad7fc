//! Menu and order service stand-ins
//!
//! Opaque collaborators the agent loop calls through the tool layer. The menu
//! is static; orders live in an in-memory store for the process lifetime.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::error::{AgentError, Result};

/// Serves the restaurant's menu, keyed by category.
#[derive(Debug, Default)]
pub struct MenuService;

impl MenuService {
    pub fn new() -> Self {
        Self
    }

    /// The full menu, category to item names.
    pub fn menu(&self) -> BTreeMap<String, Vec<String>> {
        let mut menu = BTreeMap::new();
        menu.insert(
            "Starters".to_string(),
            vec![
                "French onion soup".to_string(),
                "Garlic bread".to_string(),
                "House salad".to_string(),
            ],
        );
        menu.insert(
            "Mains".to_string(),
            vec![
                "Steak frites".to_string(),
                "Coq au vin".to_string(),
                "Ratatouille".to_string(),
                "Moules marinieres".to_string(),
            ],
        );
        menu.insert(
            "Desserts".to_string(),
            vec![
                "Creme brulee".to_string(),
                "Chocolate mousse".to_string(),
                "Tarte tatin".to_string(),
            ],
        );
        menu.insert(
            "Drinks".to_string(),
            vec![
                "House red".to_string(),
                "House white".to_string(),
                "Sparkling water".to_string(),
                "Espresso".to_string(),
            ],
        );
        menu
    }
}

/// An order placed for a table. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub table_number: u32,
    pub items: Vec<String>,
}

impl std::fmt::Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "table {}: {}", self.table_number, self.items.join(", "))
    }
}

/// Records placed orders in memory for the process lifetime.
///
/// Single writer (the `create_order` tool), single reader (loop termination)
/// within a session; access is serialized per store.
#[derive(Debug, Default)]
pub struct OrderService {
    orders: Mutex<Vec<Order>>,
}

impl OrderService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an order for the table, in call order.
    pub fn create_order(&self, table_number: u32, items: Vec<String>) -> Result<()> {
        if table_number == 0 {
            return Err(AgentError::ToolExecutionError {
                message: "invalid table number: 0".to_string(),
            });
        }
        if items.is_empty() {
            return Err(AgentError::ToolExecutionError {
                message: "order must contain at least one item".to_string(),
            });
        }

        let mut orders = self.orders.lock().expect("order store lock poisoned");
        orders.push(Order {
            table_number,
            items,
        });
        Ok(())
    }

    /// Snapshot of all orders placed so far, in call order.
    pub fn orders(&self) -> Vec<Order> {
        self.orders
            .lock()
            .expect("order store lock poisoned")
            .clone()
    }
}
