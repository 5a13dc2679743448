use crate::core::endpoint::ServiceKind;
use crate::core::suite::ScenarioEnv;
use crate::domain::ports::Scenario;
use crate::fixtures::{unique_suffix, FixtureKind};
use crate::services::{listing, promotions, review};
use crate::utils::error::{E2eError, Result};
use async_trait::async_trait;
use std::cmp::Ordering;

const PROMO_REVIEW_BODY: &str = "Friendly staff, quick service and fair prices. Would come back.";
const PROMO_REVIEW_VALUE: u8 = 4;

/// 使用者加入 promo 隊伍後發表評論，隊伍的 contributed_points 增加的量
/// 必須剛好等於該評論獲得的點數。promo 由情境自行建立，結束時刪除
pub struct PromoTeamLeaderboard;

#[async_trait]
impl Scenario for PromoTeamLeaderboard {
    fn name(&self) -> &str {
        "promo_team_leaderboard"
    }

    fn required_services(&self) -> &[ServiceKind] {
        &[
            ServiceKind::Account,
            ServiceKind::Listing,
            ServiceKind::Review,
            ServiceKind::Promotions,
        ]
    }

    async fn run(&self, env: &mut ScenarioEnv) -> Result<()> {
        let fixtures = env.fixture_config();
        let team = fixtures.promo_team.clone().ok_or_else(|| E2eError::MissingConfigError {
            field: "fixtures.promo_team".to_string(),
        })?;
        let moderator_token = env.moderator_token()?;

        let requested = format!("{}{}", fixtures.promo_prefix(), unique_suffix());
        let promo = promotions::create_promo(&env.ctx, &moderator_token, &requested, "E2E team leaderboard")
            .await
            .map_err(|e| e.in_fixture("promo_create"))?;
        // 最先登記，LIFO 清理時最後刪除
        env.fixtures
            .track(FixtureKind::Promo, &promo.code, &moderator_token);
        let code = promo.code;
        tracing::info!("🎟️ Created fixture promo {}", code);

        let user = env.new_enrolled_user(&code).await?;
        promotions::assign_team(&env.ctx, user.access_token(), &code, &team, &user.id).await?;

        let business = listing::resolve_business(&env.ctx, &env.poller, &fixtures).await?;

        // 隊伍尚未有任何貢獻時可能不在排行榜上
        let before = promotions::team_points(&promotions::leaderboard(&env.ctx, &code).await?, &team)
            .unwrap_or(0);

        let created = review::create_review(
            &env.ctx,
            user.access_token(),
            &review::NewReview::new(&business.int_xxid, PROMO_REVIEW_VALUE, PROMO_REVIEW_BODY),
        )
        .await?;
        env.fixtures
            .track(FixtureKind::Review, &created.id, user.access_token());

        let awarded = match created.points_awarded {
            Some(points) => points,
            None => promotions::business_points(&env.ctx, &code, &business.int_xxid).await?,
        };
        let expected = before + awarded;
        tracing::info!(
            "🏆 Team {} had {} point(s); expecting {} after +{}",
            team,
            before,
            expected,
            awarded
        );

        let ctx = &env.ctx;
        let code = code.as_str();
        let team = team.as_str();
        env.poller
            .until(
                &format!("team {} to reach {} point(s)", team, expected),
                move || async move {
                    let entries = promotions::leaderboard(ctx, code).await?;
                    let current = promotions::team_points(&entries, team).unwrap_or(0);
                    match current.cmp(&expected) {
                        Ordering::Equal => Ok(Some(())),
                        Ordering::Less => Ok(None),
                        Ordering::Greater => Err(E2eError::AssertionFailed {
                            message: format!(
                                "team {} contributed_points jumped to {}, expected exactly {}",
                                team, current, expected
                            ),
                        }),
                    }
                },
            )
            .await
    }
}
