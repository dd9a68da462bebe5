/*
 * Responsibility
 * - drinks の保存先に依存しない CRUD インターフェース
 * - Drink / Ingredient のドメイン型
 */
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::repos::error::RepoError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub color: String,
    pub parts: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Drink storage.
///
/// Titles are unique; a duplicate title surfaces as `RepoError::Conflict`.
#[async_trait]
pub trait DrinkRepo: Send + Sync {
    async fn list(&self) -> Result<Vec<Drink>, RepoError>;

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> Result<Drink, RepoError>;

    // `None` fields are left untouched. Returns `None` when `id` does not exist.
    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> Result<Option<Drink>, RepoError>;

    async fn delete(&self, id: i64) -> Result<bool, RepoError>;
}
