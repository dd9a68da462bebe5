/*
 * Responsibility
 * - DATABASE_URL が無い場合の in-process ストア (開発・テスト用)
 * - PgDrinkRepo と同じ意味 (title 一意、id 昇順) を保つ
 */
use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::repos::drink_repo::{Drink, DrinkRepo, Ingredient};
use crate::repos::error::RepoError;

#[derive(Debug, Default)]
struct Store {
    last_id: i64,
    drinks: BTreeMap<i64, Drink>,
}

impl Store {
    fn title_taken(&self, title: &str, except: Option<i64>) -> bool {
        self.drinks
            .values()
            .any(|d| d.title == title && Some(d.id) != except)
    }
}

#[derive(Debug, Default)]
pub struct MemoryDrinkRepo {
    store: RwLock<Store>,
}

impl MemoryDrinkRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DrinkRepo for MemoryDrinkRepo {
    async fn list(&self) -> Result<Vec<Drink>, RepoError> {
        Ok(self.store.read().await.drinks.values().cloned().collect())
    }

    async fn create(&self, title: &str, recipe: &[Ingredient]) -> Result<Drink, RepoError> {
        let mut store = self.store.write().await;
        if store.title_taken(title, None) {
            return Err(RepoError::Conflict);
        }

        store.last_id += 1;
        let drink = Drink {
            id: store.last_id,
            title: title.to_string(),
            recipe: recipe.to_vec(),
        };
        store.drinks.insert(drink.id, drink.clone());

        Ok(drink)
    }

    async fn update(
        &self,
        id: i64,
        title: Option<&str>,
        recipe: Option<&[Ingredient]>,
    ) -> Result<Option<Drink>, RepoError> {
        let mut store = self.store.write().await;
        if !store.drinks.contains_key(&id) {
            return Ok(None);
        }
        if let Some(title) = title
            && store.title_taken(title, Some(id))
        {
            return Err(RepoError::Conflict);
        }

        let Some(drink) = store.drinks.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = title {
            drink.title = title.to_string();
        }
        if let Some(recipe) = recipe {
            drink.recipe = recipe.to_vec();
        }

        Ok(Some(drink.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool, RepoError> {
        Ok(self.store.write().await.drinks.remove(&id).is_some())
    }
}
