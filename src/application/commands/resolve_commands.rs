// src/application/commands/resolve_commands.rs
//
// Link Resolution Command Handlers
//
// RULES:
// - Accept DTOs
// - Call the resolver
// - Return DTOs
// - Never contain business logic

use crate::application::{
    dto::*,
    error_handling::{ErrorResponse, ToErrorResponse},
    state::ResolverState,
};
use crate::domain::referrer::create_referrer;
use crate::events::ResolverInteraction;

/// Run the full pipeline for one incoming link
pub async fn resolve_link(
    request: LinkRequestDto,
    state: &ResolverState,
) -> Result<BottomSheetResult, ErrorResponse> {
    let referrer = request
        .referrer_package
        .as_deref()
        .map(create_referrer)
        .transpose()
        .map_err(|e| ErrorResponse::validation(format!("Invalid referrer: {}", e)))?;

    let result = state.resolver.resolve(request.to_intent(), referrer).await;
    Ok(BottomSheetResult::from(result))
}

/// Skip whatever the running resolution currently offers to skip.
/// Returns false when nothing was cancelable.
pub async fn cancel_pending_interaction(state: &ResolverState) -> Result<bool, ErrorResponse> {
    let interaction: ResolverInteraction = state.resolver.interactions().borrow().clone();
    Ok(interaction.cancel())
}

/// Persist the user's pick from the sheet
pub async fn record_app_choice(dto: AppChoiceDto, state: &ResolverState) -> Result<(), ErrorResponse> {
    let uri = crate::domain::Uri::parse(&dto.uri)
        .map_err(|e| ErrorResponse::validation(format!("Invalid URI: {}", e)))?;
    let component = dto
        .activity_name
        .as_deref()
        .map(|activity| format!("{}/{}", dto.package_name, activity));

    state
        .record_choice(&uri, &dto.package_name, component, dto.kind)
        .to_error_response()
}
