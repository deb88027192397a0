use std::env;
use std::str::FromStr;

use crate::utils::portrait::WallColors;

/// Styling knobs for one caption template (xibao/beibao).
#[derive(Debug, Clone)]
pub struct StyleConfig {
    pub font_family: String,
    pub max_font_size: u32,
    pub min_font_size: u32,
    pub offset_width: u32,
}

/// Parameters handed to the in-page logo drawer.
#[derive(Debug, Clone)]
pub struct LogoConfig {
    pub font_size: u32,
    pub transparent: bool,
    pub halo_x: i32,
    pub halo_y: i32,
}

#[derive(Debug, Clone)]
pub struct PfpConfig {
    pub enable_pfp: bool,
    pub init_name: String,
    // Declared by the original plugin but never read by it; kept for config
    // compatibility until cape rendering exists.
    #[allow(dead_code)]
    pub show_cape: bool,
    pub gradient_direction: u32,
    pub wall_colors: WallColors,
}

/// All settings are read once at startup and stay immutable afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    pub xibao: StyleConfig,
    pub beibao: StyleConfig,
    pub balogo: LogoConfig,
    pub mcpfp: PfpConfig,
    pub render_timeout_secs: u64,
}

const DEFAULT_FONT_FAMILY: &str = "\"HarmonyOS Sans SC\", \"Source Han Sans CN\", sans-serif";

impl Default for Config {
    fn default() -> Self {
        Self {
            xibao: StyleConfig {
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                max_font_size: 80,
                min_font_size: 38,
                offset_width: 900,
            },
            beibao: StyleConfig {
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                max_font_size: 90,
                min_font_size: 38,
                offset_width: 900,
            },
            balogo: LogoConfig {
                font_size: 84,
                transparent: false,
                halo_x: -18,
                halo_y: 0,
            },
            mcpfp: PfpConfig {
                enable_pfp: false,
                init_name: "steve".to_string(),
                show_cape: false,
                gradient_direction: 0,
                wall_colors: WallColors::Preset("背景1".to_string()),
            },
            render_timeout_secs: 10,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_or_str(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Environment overrides applied on top of the defaults above.
    pub fn from_env() -> Self {
        let d = Config::default();
        Config {
            xibao: StyleConfig {
                font_family: env_or_str("XIBAO_FONT_FAMILY", &d.xibao.font_family),
                max_font_size: env_or("XIBAO_MAX_FONT_SIZE", d.xibao.max_font_size),
                min_font_size: env_or("XIBAO_MIN_FONT_SIZE", d.xibao.min_font_size),
                offset_width: env_or("XIBAO_OFFSET_WIDTH", d.xibao.offset_width),
            },
            beibao: StyleConfig {
                font_family: env_or_str("BEIBAO_FONT_FAMILY", &d.beibao.font_family),
                max_font_size: env_or("BEIBAO_MAX_FONT_SIZE", d.beibao.max_font_size),
                min_font_size: env_or("BEIBAO_MIN_FONT_SIZE", d.beibao.min_font_size),
                offset_width: env_or("BEIBAO_OFFSET_WIDTH", d.beibao.offset_width),
            },
            balogo: LogoConfig {
                font_size: env_or("BALOGO_FONT_SIZE", d.balogo.font_size),
                transparent: env_or("BALOGO_TRANSPARENT", d.balogo.transparent),
                halo_x: env_or("BALOGO_HALO_X", d.balogo.halo_x),
                halo_y: env_or("BALOGO_HALO_Y", d.balogo.halo_y),
            },
            mcpfp: PfpConfig {
                enable_pfp: env_or("MCPFP_ENABLE", d.mcpfp.enable_pfp),
                init_name: env_or_str("MCPFP_INIT_NAME", &d.mcpfp.init_name),
                show_cape: env_or("MCPFP_SHOW_CAPE", d.mcpfp.show_cape),
                gradient_direction: env_or("MCPFP_GRADIENT_DIRECTION", d.mcpfp.gradient_direction),
                wall_colors: env::var("MCPFP_WALL_COLORS")
                    .map(|v| WallColors::parse(&v))
                    .unwrap_or(d.mcpfp.wall_colors),
            },
            render_timeout_secs: env_or("RENDER_TIMEOUT_SECS", d.render_timeout_secs),
        }
    }
}
