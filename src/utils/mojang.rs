use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serenity::async_trait;

pub const MOJANG_API: &str = "https://api.mojang.com";
pub const MOJANG_SESSION: &str = "https://sessionserver.mojang.com";

#[derive(Debug, Clone, Deserialize)]
pub struct UuidName {
    pub id: String,
    pub name: String,
}

#[derive(Deserialize)]
struct ProfileResponse {
    #[serde(default)]
    properties: Vec<ProfileProperty>,
}

#[derive(Deserialize)]
struct ProfileProperty {
    value: String,
}

#[derive(Deserialize)]
struct ProfileBlob {
    textures: TextureMap,
}

#[derive(Deserialize)]
struct TextureMap {
    #[serde(rename = "SKIN")]
    skin: Option<Texture>,
}

#[derive(Deserialize)]
struct Texture {
    url: String,
}

/// The two sequential identity lookups the portrait command depends on.
/// Both are best-effort: any failure is logged and turned into `None` so the
/// caller can answer with its own message for each step.
#[async_trait]
pub trait PlayerApi: Send + Sync {
    async fn uuid_by_name(&self, name: &str) -> Option<UuidName>;
    async fn profile_b64_by_uuid(&self, uuid: &str) -> Option<String>;
}

pub struct MojangApi {
    client: reqwest::Client,
    api_base: String,
    session_base: String,
}

impl MojangApi {
    pub fn new(api_base: &str, session_base: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            session_base: session_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Default for MojangApi {
    fn default() -> Self {
        Self::new(MOJANG_API, MOJANG_SESSION)
    }
}

#[async_trait]
impl PlayerApi for MojangApi {
    async fn uuid_by_name(&self, name: &str) -> Option<UuidName> {
        let url = format!("{}/users/profiles/minecraft/{}", self.api_base, name);
        let result = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<UuidName>()
                .await
        }
        .await;
        match result {
            Ok(uuid_name) => Some(uuid_name),
            Err(e) => {
                info!("uuid lookup for {} failed: {}", name, e);
                None
            }
        }
    }

    async fn profile_b64_by_uuid(&self, uuid: &str) -> Option<String> {
        let url = format!(
            "{}/session/minecraft/profile/{}",
            self.session_base,
            uuid.replace('-', "")
        );
        let result = async {
            self.client
                .get(&url)
                .send()
                .await?
                .error_for_status()?
                .json::<ProfileResponse>()
                .await
        }
        .await;
        match result {
            // The skin blob is the last property, like the original reader.
            Ok(mut profile) => profile.properties.pop().map(|p| p.value),
            Err(e) => {
                info!("profile lookup for {} failed: {}", uuid, e);
                None
            }
        }
    }
}

/// Decode the base64 profile blob and dig out the skin texture URL.
/// Any decode or parse failure simply means "no skin".
pub fn skin_url_from_profile(profile_b64: &str) -> Option<String> {
    let raw = BASE64.decode(profile_b64.trim()).ok()?;
    let blob: ProfileBlob = serde_json::from_slice(&raw).ok()?;
    Some(blob.textures.skin?.url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skin_url_is_extracted_from_valid_blob() {
        let json = r#"{"timestamp":0,"profileId":"x","profileName":"steve",
            "textures":{"SKIN":{"url":"http://textures.example/abc"}}}"#;
        let b64 = BASE64.encode(json);
        assert_eq!(
            skin_url_from_profile(&b64).as_deref(),
            Some("http://textures.example/abc")
        );
    }

    #[test]
    fn blob_without_skin_yields_none() {
        let b64 = BASE64.encode(r#"{"textures":{}}"#);
        assert_eq!(skin_url_from_profile(&b64), None);
    }

    #[test]
    fn garbage_blob_yields_none() {
        assert_eq!(skin_url_from_profile("definitely not base64 json"), None);
        assert_eq!(skin_url_from_profile(&BASE64.encode("not json either")), None);
    }

    #[tokio::test]
    async fn unreachable_api_yields_none() {
        let api = MojangApi::new("http://127.0.0.1:9", "http://127.0.0.1:9");
        assert!(api.uuid_by_name("steve").await.is_none());
        assert!(api.profile_b64_by_uuid("whatever").await.is_none());
    }
}
