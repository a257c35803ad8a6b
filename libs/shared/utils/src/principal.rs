use tracing::debug;

use shared_database::BookingStore;
use shared_models::auth::{BusinessPrincipal, User};
use shared_models::error::AppError;

/// Maps an authenticated user to the business they own.
pub async fn resolve_principal(
    store: &dyn BookingStore,
    user: &User,
) -> Result<BusinessPrincipal, AppError> {
    let business = store
        .business_by_owner(&user.id)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?
        .ok_or_else(|| AppError::NotFound("No business found for the current user".to_string()))?;

    debug!("User {} acts for business {}", user.id, business.id);

    Ok(BusinessPrincipal {
        business_id: business.id,
        user_id: user.id.clone(),
    })
}
