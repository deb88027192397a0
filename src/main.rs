pub mod commands;
pub mod config;
pub mod extensions;
pub mod render;
pub mod utils;

#[macro_use]
extern crate tracing;
#[macro_use]
extern crate serde_derive;

use std::{env, sync::Arc};

use serenity::{
    async_trait,
    framework::standard::{macros::group, StandardFramework},
    model::gateway::{GatewayIntents, Ready},
    prelude::*,
};

use commands::make::*;
use config::Config;
use render::ChromeRenderer;

#[group]
#[commands(make)]
struct General;

pub struct ConfigContainer;

impl TypeMapKey for ConfigContainer {
    type Value = Arc<Config>;
}

pub struct RendererContainer;

impl TypeMapKey for RendererContainer {
    type Value = Arc<ChromeRenderer>;
}

struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            "{} is connected! (imgmaker-rs {})",
            ready.user.name,
            env!("GIT_HASH")
        );
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt::init();

    let token = env::var("DISCORD_TOKEN").expect("Expected a token in the environment");

    let config = Arc::new(Config::from_env());
    let renderer =
        Arc::new(ChromeRenderer::new().expect("Failed to launch the headless browser"));

    let framework = StandardFramework::new()
        .configure(|c| c.prefix("!"))
        .group(&GENERAL_GROUP);

    let intents = GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&token, intents)
        .framework(framework)
        .event_handler(Handler)
        .await
        .expect("Error creating client");

    {
        let mut data = client.data.write().await;
        data.insert::<ConfigContainer>(config);
        data.insert::<RendererContainer>(renderer);
    }

    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Could not register ctrl+c handler");
        shard_manager.lock().await.shutdown_all().await;
    });

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
