use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context as _, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serenity::async_trait;

use crate::config::LogoConfig;

pub const CAPTION_TEMPLATE: &str = "public/xbbb.html";
pub const LOGO_PAGE: &str = "public/balogo.html";

/// The rendering collaborator behind every image mode that needs a browser.
/// `render_html` screenshots one element of an inline document, `draw_logo`
/// is the explicit contract for the two-part logo drawer.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render_html(&self, html: &str, selector: &str, timeout: Duration) -> Result<Vec<u8>>;
    async fn draw_logo(&self, left: &str, right: &str, style: &LogoConfig) -> Result<Vec<u8>>;
}

/// Headless-chrome implementation. One shared browser process, one fresh tab
/// per invocation, closed on every path.
pub struct ChromeRenderer {
    browser: Browser,
}

impl ChromeRenderer {
    pub fn new() -> Result<Self> {
        let browser = Browser::new(LaunchOptions::default()).context("无法启动无头浏览器")?;
        Ok(Self { browser })
    }

    fn screenshot_element(
        &self,
        tab: &Tab,
        url: &str,
        selector: &str,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        tab.navigate_to(url)?.wait_until_navigated()?;
        let element = tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .with_context(|| format!("页面中找不到元素 {}", selector))?;
        let png = element.capture_screenshot(Page::CaptureScreenshotFormatOption::Png)?;
        ensure!(!png.is_empty(), "截图结果为空");
        Ok(png)
    }

    fn draw_logo_blocking(
        &self,
        tab: &Tab,
        page_url: &str,
        left: &str,
        right: &str,
        style: &LogoConfig,
    ) -> Result<Vec<u8>> {
        tab.navigate_to(page_url)?.wait_until_navigated()?;
        let script = format!(
            "(async () => {{ \
                const ba = new BALogo({{ options: {{ fontSize: {}, transparent: {}, haloX: {}, haloY: {} }} }}); \
                await ba.draw({{ textL: {}, textR: {} }}); \
            }})()",
            style.font_size,
            style.transparent,
            style.halo_x,
            style.halo_y,
            serde_json::to_string(left)?,
            serde_json::to_string(right)?,
        );
        tab.evaluate(&script, true).context("logo 绘制脚本执行失败")?;
        let element = tab.wait_for_element("#output")?;
        let png = element.capture_screenshot(Page::CaptureScreenshotFormatOption::Png)?;
        ensure!(!png.is_empty(), "截图结果为空");
        Ok(png)
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render_html(&self, html: &str, selector: &str, timeout: Duration) -> Result<Vec<u8>> {
        let tab = self.browser.new_tab().context("打开浏览器标签页失败")?;
        let result = self.screenshot_element(&tab, &data_url(html), selector, timeout);
        let _ = tab.close(true);
        result
    }

    async fn draw_logo(&self, left: &str, right: &str, style: &LogoConfig) -> Result<Vec<u8>> {
        let page = fs::canonicalize(Path::new(LOGO_PAGE))
            .with_context(|| format!("资源文件缺失: {}", LOGO_PAGE))?;
        let tab = self.browser.new_tab().context("打开浏览器标签页失败")?;
        let url = format!("file://{}", page.display());
        let result = self.draw_logo_blocking(&tab, &url, left, right, style);
        let _ = tab.close(true);
        result
    }
}

fn data_url(html: &str) -> String {
    format!("data:text/html;charset=utf-8;base64,{}", BASE64.encode(html))
}

pub struct CaptionParams<'a> {
    pub text: &'a str,
    pub font_family: &'a str,
    pub font_color: &'a str,
    pub stroke_color: &'a str,
    pub max_font_size: u32,
    pub min_font_size: u32,
    pub offset_width: u32,
    pub background: &'a [u8],
}

/// Load the caption template from disk and substitute its placeholders.
pub fn caption_html(params: &CaptionParams) -> Result<String> {
    let template = fs::read_to_string(CAPTION_TEMPLATE)
        .with_context(|| format!("资源文件缺失: {}", CAPTION_TEMPLATE))?;
    Ok(fill_caption_template(&template, params))
}

/// Each placeholder appears exactly once in the template, so a single
/// `replacen` per variable is enough.
fn fill_caption_template(template: &str, p: &CaptionParams) -> String {
    let text = escape_html(p.text).replace('\n', "<br/>");
    template
        .replacen("var(--font-family)", p.font_family, 1)
        .replacen("var(--font-color)", p.font_color, 1)
        .replacen("var(--stroke-color)", p.stroke_color, 1)
        .replacen(
            "VAR_BACKGROUND_IMAGE",
            &format!("data:image/png;base64,{}", BASE64.encode(p.background)),
            1,
        )
        .replacen("VAR_CONTENT", &text, 1)
        .replacen("VAR_MAX_FONT_SIZE", &p.max_font_size.to_string(), 1)
        .replacen("VAR_MIN_FONT_SIZE", &p.min_font_size.to_string(), 1)
        .replacen("VAR_OFFSET_WIDTH", &p.offset_width.to_string(), 1)
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&#39;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params<'a>(text: &'a str) -> CaptionParams<'a> {
        CaptionParams {
            text,
            font_family: "sans-serif",
            font_color: "#ff0a0a",
            stroke_color: "#ffde00",
            max_font_size: 80,
            min_font_size: 38,
            offset_width: 900,
            background: &[1, 2, 3],
        }
    }

    #[test]
    fn escapes_every_special_character() {
        assert_eq!(
            escape_html(r#"a&b<c>d'e"f"#),
            "a&amp;b&lt;c&gt;d&#39;e&quot;f"
        );
    }

    #[test]
    fn template_substitution_escapes_and_breaks_lines() {
        let template = "font:var(--font-family);color:var(--font-color);\
            stroke:var(--stroke-color);bg:VAR_BACKGROUND_IMAGE;\
            w:VAR_OFFSET_WIDTHpx;max:VAR_MAX_FONT_SIZE;min:VAR_MIN_FONT_SIZE;\
            [VAR_CONTENT]";
        let html = fill_caption_template(template, &params("<a>\n&b"));
        assert!(html.contains("[&lt;a&gt;<br/>&amp;b]"));
        assert!(html.contains("w:900px"));
        assert!(html.contains("max:80"));
        assert!(html.contains("min:38"));
        assert!(html.contains("data:image/png;base64,AQID"));
        assert!(!html.contains("VAR_"));
        assert!(!html.contains("var(--"));
    }

    #[test]
    fn data_url_is_base64_html() {
        let url = data_url("<p>hi</p>");
        assert!(url.starts_with("data:text/html;charset=utf-8;base64,"));
    }

    #[test]
    fn shipped_template_has_every_placeholder_once() {
        let template = std::fs::read_to_string("public/xbbb.html").unwrap();
        for needle in [
            "var(--font-family)",
            "var(--font-color)",
            "var(--stroke-color)",
            "VAR_BACKGROUND_IMAGE",
            "VAR_CONTENT",
            "VAR_MAX_FONT_SIZE",
            "VAR_MIN_FONT_SIZE",
            "VAR_OFFSET_WIDTH",
        ] {
            assert_eq!(template.matches(needle).count(), 1, "placeholder {}", needle);
        }
    }

    // Needs a local Chrome/Chromium binary; run with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn renders_heading_end_to_end() {
        let renderer = ChromeRenderer::new().unwrap();
        let a = renderer
            .render_html(
                "<div style=\"padding: 20px; background: white;\"><h1>A</h1></div>",
                "div",
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        let b = renderer
            .render_html(
                "<div style=\"padding: 20px; background: white;\"><h1>B</h1></div>",
                "div",
                Duration::from_secs(10),
            )
            .await
            .unwrap();
        assert!(!a.is_empty() && !b.is_empty());
        assert_ne!(a, b);
    }
}
