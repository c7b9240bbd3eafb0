use pmm_core::messages::{AuthenticationReply, AuthenticationRequest, CURRENT_API_VERSION, MessageErrorCode};

use crate::error::ClientError;

use super::{HandlerContext, HandlerResult};

/// Precedence matters here: `api_version` is checked before `game_id`
/// before `game_version`, so a client on an incompatible protocol version
/// never learns anything about game identity mismatches.
pub fn handle(ctx: &mut HandlerContext, req: AuthenticationRequest) -> HandlerResult<AuthenticationReply> {
    if ctx.session.is_authenticated() {
        return Err(ClientError::fatal(MessageErrorCode::OperationInvalid).into());
    }

    if req.player_name.as_str().is_ok_and(str::is_empty) || req.player_name.as_str().is_err() {
        return Err(ClientError::fatal(MessageErrorCode::RequestParameterWrong).into());
    }

    if req.api_version != CURRENT_API_VERSION {
        return Ok((
            AuthenticationReply {
                result: MessageErrorCode::ApiVersionMismatch,
                api_version: CURRENT_API_VERSION,
                game_version: req.game_version.clone(),
                player_tag: 0,
            },
            true,
        ));
    }

    let auth = &ctx.state.config.authentication;
    let client_game_id = req.game_id.as_str().unwrap_or_default();
    if client_game_id != auth.game_id {
        return Ok((
            AuthenticationReply {
                result: MessageErrorCode::GameIdMismatch,
                api_version: CURRENT_API_VERSION,
                game_version: req.game_version.clone(),
                player_tag: 0,
            },
            true,
        ));
    }

    if auth.enable_game_version_check {
        let client_game_version = req.game_version.as_str().unwrap_or_default();
        if client_game_version != auth.game_version {
            // Echo the server's expected version, not the client's rejected
            // one, so the client knows what to upgrade (or downgrade) to.
            // `validate()` already bounds this to 24 bytes at config load.
            let expected = pmm_core::codec::FixedString::new(&auth.game_version).unwrap_or_default();
            return Ok((
                AuthenticationReply {
                    result: MessageErrorCode::GameVersionMismatch,
                    api_version: CURRENT_API_VERSION,
                    game_version: expected,
                    player_tag: 0,
                },
                true,
            ));
        }
    }

    let full_name = ctx
        .state
        .player_names
        .assign(req.player_name.clone())
        .map_err(|e| crate::error::ServerFault::RegistryInvariant(e.to_string()))?;
    let tag = full_name.tag;
    ctx.session.authenticate(full_name);

    Ok((
        AuthenticationReply {
            result: MessageErrorCode::Ok,
            api_version: CURRENT_API_VERSION,
            game_version: req.game_version,
            player_tag: tag,
        },
        false,
    ))
}
