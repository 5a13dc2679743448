use crate::core::endpoint::ServiceKind;
use crate::core::suite::ScenarioEnv;
use crate::domain::ports::Scenario;
use crate::fixtures::FixtureKind;
use crate::services::{listing, media};
use crate::utils::error::Result;
use async_trait::async_trait;

const IMAGE_FILE_NAME: &str = "e2e-pixel.png";

/// 上傳圖片並連結到商家後，商家的圖片列表會包含該圖片
pub struct ImageLinking;

#[async_trait]
impl Scenario for ImageLinking {
    fn name(&self) -> &str {
        "image_linking"
    }

    fn required_services(&self) -> &[ServiceKind] {
        &[ServiceKind::Account, ServiceKind::Listing, ServiceKind::Media]
    }

    async fn run(&self, env: &mut ScenarioEnv) -> Result<()> {
        let user = env.new_user().await?;
        let business = listing::resolve_business(&env.ctx, &env.poller, &env.fixture_config()).await?;

        let image = media::upload_image(
            &env.ctx,
            user.access_token(),
            IMAGE_FILE_NAME,
            media::SAMPLE_PNG.to_vec(),
        )
        .await?;
        env.fixtures
            .track(FixtureKind::Image, &image.id, user.access_token());

        media::link_image(&env.ctx, user.access_token(), &image.id, &business.int_xxid).await?;

        let ctx = &env.ctx;
        let int_xxid = business.int_xxid.as_str();
        let image_id = image.id.as_str();
        env.poller
            .until(
                &format!("image {} on business {}", image_id, int_xxid),
                move || async move {
                    let images = media::business_images(ctx, int_xxid).await?;
                    Ok(images.iter().any(|i| i.id == image_id).then_some(()))
                },
            )
            .await
    }
}
