use std::sync::Arc;

use tracing::info;

use crate::cache::{Cache, Channel, CurrentUser};
use crate::events::ApplyOutcome;
use crate::model::{CurrentUserPayload, Ready};

/// A new session: nothing we had can be trusted anymore. The guilds come back one by one through
/// guild creates.
pub fn on_ready(ready: Ready, cache: &Cache) -> ApplyOutcome {
    info!(
        "Session {} ready as {} with {} guilds",
        ready.session_id,
        ready.user.username,
        ready.guilds.len()
    );
    let user = Arc::new(CurrentUser::from_user(ready.user));
    let private_channels = ready
        .private_channels
        .into_iter()
        .map(|channel| Arc::new(Channel::from_private_channel(channel)))
        .collect();

    cache.reset(user, ready.guilds.into_iter().map(|guild| guild.id), private_channels);
    ApplyOutcome::Changed
}

pub fn on_user_update(user: CurrentUserPayload, cache: &Cache) -> ApplyOutcome {
    cache.set_current_user(Arc::new(CurrentUser::from_user(user)));
    ApplyOutcome::Changed
}
