use std::borrow::Cow;
use std::fs;
use std::time::Duration;

use anyhow::{ensure, Context as _, Result};
use serenity::framework::standard::{macros::command, Args, CommandResult};
use serenity::model::prelude::*;
use serenity::prelude::*;

use crate::config::{Config, StyleConfig};
use crate::extensions::*;
use crate::render::{self, Renderer};
use crate::utils::mojang::{skin_url_from_profile, MojangApi, PlayerApi};
use crate::utils::portrait;

const PROMPT_MISSING_CONTENT: &str = "请提供要生成的内容";
const XIBAO_BACKGROUND: &str = "assets/images/xibao.png";
const BEIBAO_BACKGROUND: &str = "assets/images/beibao.png";

pub enum MakeReply {
    Image(Vec<u8>),
    Text(String),
}

#[derive(Debug, PartialEq)]
enum Mode<'a> {
    Xibao,
    Beibao,
    Balogo { right: &'a str },
    Mcpfp,
    Plain,
}

/// The mode flag is the leading token; everything after it is kept verbatim
/// (captions need the embedded newlines). `-balogo` additionally takes the
/// next token as the right-hand label.
fn parse_mode(input: &str) -> (Mode, &str) {
    fn strip_flag<'a>(input: &'a str, flag: &str) -> Option<&'a str> {
        let rest = input.strip_prefix(flag)?;
        if rest.is_empty() {
            Some("")
        } else if rest.starts_with(char::is_whitespace) {
            Some(rest.trim_start())
        } else {
            None
        }
    }

    let input = input.trim();
    if let Some(rest) = strip_flag(input, "-xb") {
        (Mode::Xibao, rest)
    } else if let Some(rest) = strip_flag(input, "-bb") {
        (Mode::Beibao, rest)
    } else if let Some(rest) = strip_flag(input, "-balogo") {
        let (right, left) = match rest.split_once(char::is_whitespace) {
            Some((right, left)) => (right, left.trim_start()),
            None => (rest, ""),
        };
        (Mode::Balogo { right }, left)
    } else if let Some(rest) = strip_flag(input, "-mcpfp") {
        (Mode::Mcpfp, rest)
    } else {
        (Mode::Plain, input)
    }
}

#[command]
#[usage("[-xb|-bb|-balogo <右侧文本>|-mcpfp] <内容>")]
async fn make(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let config = ctx.get_config().await;
    let renderer = ctx.get_renderer().await;
    let players = MojangApi::default();
    match run_make(&config, renderer.as_ref(), &players, args.rest()).await {
        MakeReply::Image(png) => {
            msg.channel_id
                .send_message(&ctx.http, |m| {
                    m.add_file(AttachmentType::Bytes {
                        data: Cow::from(png),
                        filename: "make.png".to_string(),
                    })
                })
                .await?;
        }
        MakeReply::Text(text) => {
            msg.reply(ctx, text).await?;
        }
    }
    Ok(())
}

/// Single funnel for the whole command: every error below becomes one short
/// user-facing line, nothing escapes to the host.
pub async fn run_make(
    config: &Config,
    renderer: &dyn Renderer,
    players: &dyn PlayerApi,
    input: &str,
) -> MakeReply {
    match run_make_inner(config, renderer, players, input).await {
        Ok(reply) => reply,
        Err(e) => MakeReply::Text(format!("图片生成失败：{}", e)),
    }
}

async fn run_make_inner(
    config: &Config,
    renderer: &dyn Renderer,
    players: &dyn PlayerApi,
    input: &str,
) -> Result<MakeReply> {
    let (mode, content) = parse_mode(input);
    let timeout = Duration::from_secs(config.render_timeout_secs);

    match mode {
        Mode::Xibao => {
            caption(renderer, &config.xibao, XIBAO_BACKGROUND, "#ff0a0a", "#ffde00", content, timeout)
                .await
        }
        Mode::Beibao => {
            caption(renderer, &config.beibao, BEIBAO_BACKGROUND, "#000500", "#c6c6c6", content, timeout)
                .await
        }
        Mode::Balogo { right } => {
            if content.is_empty() {
                return Ok(MakeReply::Text(PROMPT_MISSING_CONTENT.to_string()));
            }
            let png = renderer.draw_logo(content, right, &config.balogo).await?;
            ensure!(!png.is_empty(), "渲染结果为空");
            Ok(MakeReply::Image(png))
        }
        Mode::Mcpfp => {
            if !config.mcpfp.enable_pfp {
                return Ok(MakeReply::Text("该指令未启用".to_string()));
            }
            let player = if content.is_empty() {
                config.mcpfp.init_name.as_str()
            } else {
                content
            };
            let Some(uuid_name) = players.uuid_by_name(player).await else {
                return Ok(MakeReply::Text("未找到该玩家".to_string()));
            };
            info!("resolved player {} -> {}", uuid_name.name, uuid_name.id);
            let Some(profile_b64) = players.profile_b64_by_uuid(&uuid_name.id).await else {
                return Ok(MakeReply::Text("获取玩家资料失败".to_string()));
            };
            let skin_url = skin_url_from_profile(&profile_b64);
            let png = portrait::generate(
                &config.mcpfp.wall_colors,
                config.mcpfp.gradient_direction,
                skin_url.as_deref(),
            )?;
            Ok(MakeReply::Image(png))
        }
        Mode::Plain => {
            if content.is_empty() {
                return Ok(MakeReply::Text(PROMPT_MISSING_CONTENT.to_string()));
            }
            let html = format!(
                "<div style=\"padding: 20px; background: white;\"><h1>{}</h1></div>",
                render::escape_html(content)
            );
            let png = renderer.render_html(&html, "div", timeout).await?;
            ensure!(!png.is_empty(), "渲染结果为空");
            Ok(MakeReply::Image(png))
        }
    }
}

async fn caption(
    renderer: &dyn Renderer,
    style: &StyleConfig,
    background_path: &str,
    font_color: &str,
    stroke_color: &str,
    content: &str,
    timeout: Duration,
) -> Result<MakeReply> {
    if content.is_empty() {
        return Ok(MakeReply::Text(PROMPT_MISSING_CONTENT.to_string()));
    }
    let background =
        fs::read(background_path).with_context(|| format!("资源文件缺失: {}", background_path))?;
    let html = render::caption_html(&render::CaptionParams {
        text: content,
        font_family: &style.font_family,
        font_color,
        stroke_color,
        max_font_size: style.max_font_size,
        min_font_size: style.min_font_size,
        offset_width: style.offset_width,
        background: &background,
    })?;
    let png = renderer.render_html(&html, ".container", timeout).await?;
    ensure!(!png.is_empty(), "渲染结果为空");
    Ok(MakeReply::Image(png))
}
