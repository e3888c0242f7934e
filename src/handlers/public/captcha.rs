// handlers/public/captcha.rs - GET /captcha and POST /checkCaptcha handlers

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::api::params::text_field;
use crate::database::models::{Session, SessionInfo};
use crate::error::ApiError;
use crate::handlers::context::Context;
use crate::middleware::response::{HandlerResult, Success};
use crate::utils::random_string;

/// GET /captcha?phone=... - open a captcha session for a phone number
///
/// The code is echoed back in the response; nothing is actually sent.
pub async fn captcha_get(ctx: Context) -> HandlerResult {
    let phone = text_field(&ctx.query, "phone").ok_or_else(|| ApiError::bad_request("phone is required"))?;

    let settings = &ctx.state.captcha;
    let captcha = random_string(settings.code_length);
    let info = SessionInfo {
        phone,
        captcha: captcha.clone(),
    };
    let expire_time = Utc::now() + Duration::seconds(settings.ttl_secs);
    let session = Session::new(random_string(settings.id_length), &info, expire_time)?;

    let session = ctx.state.sessions().update(&session).await?;
    debug!("Issued captcha session {} for {}", session.id, info.phone);

    Ok(Success::new()
        .with("captchaId", session.id)
        .with("captcha", captcha))
}

/// POST /checkCaptcha - verify a captcha code against its session
///
/// A session is good for exactly one attempt: it is removed before the code
/// is compared, whatever the outcome.
pub async fn check_captcha_post(ctx: Context) -> HandlerResult {
    let captcha = text_field(&ctx.data, "captcha").ok_or_else(|| ApiError::bad_request("captcha is required"))?;
    let captcha_id =
        text_field(&ctx.data, "captchaId").ok_or_else(|| ApiError::bad_request("captchaId is required"))?;

    let sessions = ctx.state.sessions();
    let Some(session) = sessions.select_id(&captcha_id).await? else {
        return Err(ApiError::bad_request("captcha does not exist"));
    };

    // Whoever removes the session owns the attempt
    let removed = sessions
        .delete_any(|candidate: &Session| candidate.id == session.id)
        .await?;
    if removed == 0 {
        return Err(ApiError::bad_request("captcha does not exist"));
    }

    if session.is_expired(Utc::now()) {
        debug!("Captcha session {} expired at {}", session.id, session.expire_time);
        return Err(ApiError::bad_request("captcha expired"));
    }

    let info = session.info()?;
    if info.captcha != captcha {
        warn!("Wrong captcha for session {}", session.id);
        return Err(ApiError::bad_request("wrong captcha"));
    }

    Ok(Success::new())
}
