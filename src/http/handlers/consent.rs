use axum::{
    extract::{Query, State},
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    config::{parse_ttl, ConsentSettings},
    consent::{
        evaluate_callback, state::current_epoch_seconds, CallbackParams, ConsentOutcome,
        TenantSelector,
    },
    http::error::AppError,
    reporting::ThreadStore,
};

use super::super::SharedContext;

#[derive(Deserialize)]
pub struct GenerateRequest {
    #[serde(rename = "tenantId")]
    pub tenant_id: Option<String>,
    #[serde(rename = "expiresIn")]
    pub expires_in: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct GenerateResponse {
    pub url: String,
}

/// `POST /api/consent/generate`: mint a signed admin-consent URL.
pub async fn generate<S>(
    State(ctx): State<SharedContext<S>>,
    Json(GenerateRequest {
        tenant_id,
        expires_in,
    }): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, AppError>
where
    S: ThreadStore + 'static,
{
    let tenant_id = tenant_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::bad_request("tenantId is required (or use 'organizations')"))?;
    let selector = TenantSelector::parse(tenant_id)?;

    let ttl = expires_in
        .as_deref()
        .map(parse_ttl)
        .transpose()
        .map_err(|err| AppError::bad_request(err.to_string()))?;

    let url = ctx.issuer.issue(&selector, ttl).await?;
    tracing::info!(tenant = selector.as_str(), "admin consent url generated");

    Ok(Json(GenerateResponse {
        url: url.to_string(),
    }))
}

/// `GET /api/consent/callback`: classify the round-trip and redirect.
///
/// This endpoint never fails outward; whatever happens, the browser is sent
/// to one of the two configured destinations with a short reason code.
pub async fn callback<S>(
    Query(params): Query<CallbackParams>,
    State(ctx): State<SharedContext<S>>,
) -> Redirect
where
    S: ThreadStore + 'static,
{
    // a missing state never touches the signing secret
    let outcome = if params.state.is_none() {
        ConsentOutcome::Failure {
            reason: "missing_state".to_string(),
        }
    } else {
        match ctx.secrets.signer().await {
            Ok(signer) => evaluate_callback(&params, &signer, current_epoch_seconds()),
            Err(err) => {
                tracing::error!(error = %err, "signing secret unavailable during consent callback");
                ConsentOutcome::Failure {
                    reason: "server_error".to_string(),
                }
            }
        }
    };

    redirect_for(&ctx.settings, &outcome)
}

fn redirect_for(settings: &ConsentSettings, outcome: &ConsentOutcome) -> Redirect {
    let target: Url = match outcome {
        ConsentOutcome::Success { tenant } => {
            tracing::info!(tenant = tenant.as_str(), "admin consent granted");
            let mut url = settings.success_redirect.clone();
            url.query_pairs_mut()
                .append_pair("consent", "success")
                .append_pair("tenant", tenant);
            url
        }
        ConsentOutcome::Failure { reason } => {
            tracing::warn!(reason = reason.as_str(), "admin consent callback failed");
            let mut url = settings.failure_redirect.clone();
            url.query_pairs_mut()
                .append_pair("consent", "error")
                .append_pair("msg", reason);
            url
        }
    };

    Redirect::temporary(target.as_str())
}
