use crate::core::client::{ApiRequest, ApiResponse, ClientContext, MultipartUpload};
use crate::core::endpoint::ServiceKind;
use crate::domain::model::Image;
use crate::utils::error::Result;

const IMAGES_PATH: &str = "/images";

/// 1x1 透明 PNG，上傳測試用
pub const SAMPLE_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

fn content_type_for(file_name: &str) -> &'static str {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

pub async fn upload_image(
    ctx: &ClientContext,
    token: &str,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<Image> {
    let upload = MultipartUpload::new("image", file_name, content_type_for(file_name), bytes);

    let image: Image = ctx
        .on(ServiceKind::Media)
        .send(ApiRequest::post(IMAGES_PATH).bearer(token).multipart(upload))
        .await?
        .expect_success()?
        .parse()?;

    tracing::debug!("🖼️ Uploaded image {} ({})", image.id, file_name);
    Ok(image)
}

/// 將圖片連結到商家（以 int_xxid 識別）
pub async fn link_image(ctx: &ClientContext, token: &str, image_id: &str, int_xxid: &str) -> Result<()> {
    ctx.on(ServiceKind::Media)
        .send(
            ApiRequest::post(format!("{}/{}/link", IMAGES_PATH, image_id))
                .bearer(token)
                .form([("int_xxid", int_xxid)]),
        )
        .await?
        .expect_success()?;
    Ok(())
}

pub async fn business_images(ctx: &ClientContext, int_xxid: &str) -> Result<Vec<Image>> {
    let response = ctx
        .on(ServiceKind::Media)
        .get(&format!("/business/{}/images", int_xxid))
        .await?
        .expect_success()?;
    Ok(serde_json::from_value(response.field("images")?.clone())?)
}

pub async fn update_caption(
    ctx: &ClientContext,
    token: &str,
    image_id: &str,
    caption: &str,
) -> Result<Image> {
    ctx.on(ServiceKind::Media)
        .send(
            ApiRequest::put(format!("{}/{}/caption", IMAGES_PATH, image_id))
                .bearer(token)
                .form([("caption", caption)]),
        )
        .await?
        .expect_success()?
        .parse()
}

pub async fn report_image(ctx: &ClientContext, token: &str, image_id: &str, reason: &str) -> Result<()> {
    ctx.on(ServiceKind::Media)
        .send(
            ApiRequest::post(format!("{}/{}/report", IMAGES_PATH, image_id))
                .bearer(token)
                .form([("reason", reason)]),
        )
        .await?
        .expect_success()?;
    Ok(())
}

pub async fn delete_image(ctx: &ClientContext, token: &str, image_id: &str) -> Result<ApiResponse> {
    ctx.on(ServiceKind::Media)
        .send(ApiRequest::delete(format!("{}/{}", IMAGES_PATH, image_id)).bearer(token))
        .await
}
