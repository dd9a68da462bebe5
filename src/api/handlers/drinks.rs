/*
 * Responsibility
 * - /drinks 系 CRUD handler
 * - 権限チェックは routes 側の protect(...) で済んでいる前提
 * - Authorized は監査ログ用に subject を参照するだけ
 */
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};

use crate::{
    api::{
        dto::drinks::{
            CreateDrinkRequest, DeleteDrinkResponse, DrinkShort, DrinksResponse,
            UpdateDrinkRequest,
        },
        extractors::Authorized,
    },
    error::AppError,
    repos::Drink,
    state::AppState,
};

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::bad_request("INVALID_BODY", rejection.body_text()))
}

pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse<DrinkShort>>, AppError> {
    let drinks = state.drinks.list().await?;

    Ok(Json(DrinksResponse::new(
        drinks.into_iter().map(DrinkShort::from).collect(),
    )))
}

pub async fn list_drinks_detail(
    State(state): State<AppState>,
    Authorized(_claims): Authorized,
) -> Result<Json<DrinksResponse<Drink>>, AppError> {
    let drinks = state.drinks.list().await?;

    Ok(Json(DrinksResponse::new(drinks)))
}

pub async fn create_drink(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
    payload: Result<Json<CreateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Drink>>, AppError> {
    let req = json_body(payload)?;
    req.validate()
        .map_err(|msg| AppError::unprocessable("INVALID_DRINK", msg))?;

    let drink = state.drinks.create(req.title.trim(), &req.recipe).await?;

    tracing::info!(
        drink_id = drink.id,
        subject = claims.subject.as_deref().unwrap_or("-"),
        "drink created"
    );

    Ok(Json(DrinksResponse::new(vec![drink])))
}

pub async fn update_drink(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
    Path(drink_id): Path<i64>,
    payload: Result<Json<UpdateDrinkRequest>, JsonRejection>,
) -> Result<Json<DrinksResponse<Drink>>, AppError> {
    let req = json_body(payload)?;
    if req.is_empty() {
        return Err(AppError::bad_request(
            "INVALID_BODY",
            "nothing to update: expected title and/or recipe",
        ));
    }
    req.validate()
        .map_err(|msg| AppError::unprocessable("INVALID_DRINK", msg))?;

    let drink = state
        .drinks
        .update(
            drink_id,
            req.title.as_deref().map(str::trim),
            req.recipe.as_deref(),
        )
        .await?
        .ok_or(AppError::not_found("drink"))?;

    tracing::info!(
        drink_id,
        subject = claims.subject.as_deref().unwrap_or("-"),
        "drink updated"
    );

    Ok(Json(DrinksResponse::new(vec![drink])))
}

pub async fn delete_drink(
    State(state): State<AppState>,
    Authorized(claims): Authorized,
    Path(drink_id): Path<i64>,
) -> Result<Json<DeleteDrinkResponse>, AppError> {
    if !state.drinks.delete(drink_id).await? {
        return Err(AppError::not_found("drink"));
    }

    tracing::info!(
        drink_id,
        subject = claims.subject.as_deref().unwrap_or("-"),
        "drink deleted"
    );

    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: drink_id,
    }))
}
