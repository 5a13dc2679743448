use crate::core::endpoint::ServiceKind;
use crate::core::suite::ScenarioEnv;
use crate::domain::ports::Scenario;
use crate::fixtures::FixtureKind;
use crate::services::{listing, review};
use crate::utils::error::{E2eError, Result};
use async_trait::async_trait;

pub const REVIEW_BODY: &str = "This business is very business-like...";
pub const REVIEW_VALUE: u8 = 3;

/// 新使用者發表一則評論後，`/usr/reviews` 只會有那一則，且分數相同
pub struct ReviewRoundTrip;

#[async_trait]
impl Scenario for ReviewRoundTrip {
    fn name(&self) -> &str {
        "review_round_trip"
    }

    fn required_services(&self) -> &[ServiceKind] {
        &[ServiceKind::Account, ServiceKind::Listing, ServiceKind::Review]
    }

    async fn run(&self, env: &mut ScenarioEnv) -> Result<()> {
        let user = env.new_user().await?;
        let business = listing::resolve_business(&env.ctx, &env.poller, &env.fixture_config()).await?;

        let created = review::create_review(
            &env.ctx,
            user.access_token(),
            &review::NewReview::new(&business.int_xxid, REVIEW_VALUE, REVIEW_BODY),
        )
        .await?;
        env.fixtures
            .track(FixtureKind::Review, &created.id, user.access_token());

        let ctx = &env.ctx;
        let token = user.access_token();
        let reviews = env
            .poller
            .until("review to appear in /usr/reviews", move || async move {
                let reviews = review::user_reviews(ctx, token).await?;
                Ok((!reviews.is_empty()).then_some(reviews))
            })
            .await?;

        if reviews.len() != 1 {
            return Err(E2eError::AssertionFailed {
                message: format!("expected exactly 1 review, found {}", reviews.len()),
            });
        }
        let listed = &reviews[0];
        if listed.id != created.id {
            return Err(E2eError::AssertionFailed {
                message: format!("listed review {} is not the created {}", listed.id, created.id),
            });
        }
        if listed.value != REVIEW_VALUE {
            return Err(E2eError::AssertionFailed {
                message: format!("review value expected {}, got {}", REVIEW_VALUE, listed.value),
            });
        }

        Ok(())
    }
}
