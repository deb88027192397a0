use std::sync::Arc;

use serenity::{async_trait, client};

use crate::{config::Config, render::ChromeRenderer, ConfigContainer, RendererContainer};

#[async_trait]
pub trait ClientContextExt {
    async fn get_config(&self) -> Arc<Config>;
    async fn get_renderer(&self) -> Arc<ChromeRenderer>;
}

#[async_trait]
impl ClientContextExt for client::Context {
    async fn get_config(&self) -> Arc<Config> {
        self.data.read().await.get::<ConfigContainer>().unwrap().clone()
    }

    async fn get_renderer(&self) -> Arc<ChromeRenderer> {
        self.data.read().await.get::<RendererContainer>().unwrap().clone()
    }
}
