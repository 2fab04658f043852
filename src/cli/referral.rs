//! Handlers for `teamex referral`.

use serde::Serialize;

use super::output::print_success;
use super::ReferralCommand;
use crate::app::App;
use crate::domain::{ReferralEdge, ReferredUser, UserId};
use crate::error::Result;
use crate::service::{referral_code, referral_link};

#[derive(Serialize)]
struct ReferralView {
    referrer: Option<ReferralEdge>,
    referred_users: Vec<ReferredUser>,
}

#[derive(Serialize)]
struct InviteView {
    code: String,
    link: String,
}

pub async fn execute(app: &App, command: ReferralCommand) -> Result<()> {
    let registry = app.referral_registry();
    match command {
        ReferralCommand::Add { referrer, referred } => {
            let edge = registry
                .add_referral(&UserId::new(referrer), &UserId::new(referred))
                .await?;
            print_success(edge)
        }
        ReferralCommand::Show { user } => {
            let user = UserId::new(user);
            let view = ReferralView {
                referrer: registry.get_referrer(&user).await?,
                referred_users: registry.get_downstream(&user).await?,
            };
            print_success(view)
        }
        ReferralCommand::Link { user } => {
            let user = UserId::new(user);
            let view = InviteView {
                code: referral_code(&user),
                link: referral_link(&user, &app.config().telegram.bot_username),
            };
            print_success(view)
        }
    }
}
