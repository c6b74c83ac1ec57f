//! HTML digest page, rendered with a handlebars template.
//!
//! Item text arrives already marked up and goes out unescaped; every other
//! value (titles, domains, descriptions, links) is escaped by the template.

use chrono::{Local, TimeZone};
use handlebars::Handlebars;
use html_escape::{encode_quoted_attribute, encode_text};
use serde::Serialize;

use crate::app::Result;
use crate::domain::{Item, Media};

const PAGE_TEMPLATE: &str = "page";

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
body { font-family: Helvetica; }
.item-list { display: grid; grid-gap: 0px; }
.item { display: grid; grid-template-columns: 100px 200px 1000px; border-top: 1px solid gray; padding: 10px; }
.item:nth-child(odd) { background-color: hsl(0, 0%, 90%); }
.placeholder { display: flex; align-items: center; justify-content: center; width: 300px; height: 200px; background-color: silver; }
.thumbnails { display: grid; grid-template-columns: 325px 325px 325px; grid-gap: 10px; }
.image-thumbnail { border-radius: 5%; }
img { width: 320px; height: 180px; object-fit: contain; background-color: darkgrey; }
.container { position: relative; }
.container p { position: absolute; bottom: 0; right: 0; color: white; background-color: black; font-size: xx-large; padding: 5px; margin: 5px; opacity: 50%; }
.datestamp { margin: 10px; font-weight: bold; display: flex; flex-direction: column; gap: 10px; }
.datestamp a { text-decoration: none; }
span.time { font-size: large; font-weight: bold; }
span.date { font-size: small; }
.channel { margin-top: 10px; display: flex; flex-direction: column; gap: 10px; font-size: large; font-weight: bold; }
.channel-title { font-size: small; color: gray; }
.channel .forwarded { font-style: italic; }
.message p { margin-top: 10px; }
a { color: darkred; }
a:hover { color: red; }
blockquote { margin: 1em 2em; color: hsl(0, 0%, 25%); border-left: 4px solid darkred; padding-left: 1em; }
</style>
</head>
<body>
<div class='item-list'>
{{#each items}}
<span class='item' id="item-{{@index}}" data-message-id="{{message_id}}">
<span class='datestamp'>
<span class="time"><a href="{{permalink}}">{{time}}</a></span>
<span class="date"><a href="{{permalink}}">{{date}}</a></span>
</span>
<span class='channel'>
{{#if forwarded}}
<span class="domain forwarded">@{{domain}}</span>
<span class="channel-title forwarded">({{title}})</span>
{{else}}
<span class="domain">@{{domain}}</span>
<span class="channel-title">({{title}})</span>
{{/if}}
</span>
<span class='message'>
{{{text}}}
{{#if linked_page}}
<blockquote class='webpage'>
<span class='link'><a href="{{linked_page.url}}" target="_blank">{{linked_page.title}}</a></span>
<span class='description'>{{{linked_page.description}}}</span>
{{/if}}
<span class="thumbnails">
{{#each media}}
{{#if is_video}}
{{#if src}}
<span class='image'><span class='container'><a href="{{link}}"><img class="video-thumbnail" src="{{src}}" width="{{width}}" height="{{height}}"></a><p>{{duration}}</p></span></span>
{{else}}
<span class='placeholder'><a href="{{link}}">Video: {{duration}}</a></span>
{{/if}}
{{else}}
{{#if src}}
<span class='image'><a href="{{link}}"><img class="image-thumbnail" src="{{src}}"></a></span>
{{else}}
<span class='placeholder'><a href="{{link}}">Image</a></span>
{{/if}}
{{/if}}
{{/each}}
</span>
{{#if linked_page}}
</blockquote>
{{/if}}
</span>
</span>
{{/each}}
</div>
<script>
function checkVisible(elm, threshold) {
  threshold = threshold || 0
  var rect = elm.getBoundingClientRect()
  var viewHeight = Math.max(document.documentElement.clientHeight, window.innerHeight)
  return !(rect.bottom - threshold < 0) && !(rect.top - viewHeight + threshold >= 0)
}

document.addEventListener('keydown', function(event) {
  var up
  if (event.key === 'j') {
    up = false
  } else if (event.key === 'k') {
    up = true
  } else {
    return true
  }
  var items = document.querySelectorAll('.item')
  for (let i = 0; i < items.length; ++i) {
    if (checkVisible(items[i], 50)) {
      if (up && i > 0) {
        items[i - 1].scrollIntoView({behavior: 'smooth', block: 'end'})
      } else if (!up && i != items.length - 1) {
        items[i + 1].scrollIntoView({behavior: 'smooth', block: 'start'})
      }
      return false
    }
  }
  return false
})
</script>
</body>
</html>
"#;

#[derive(Serialize)]
struct PageView {
    items: Vec<ItemView>,
}

#[derive(Serialize)]
struct ItemView {
    message_id: i64,
    permalink: String,
    time: String,
    date: String,
    forwarded: bool,
    domain: String,
    title: String,
    /// Pre-rendered paragraphs.
    text: String,
    linked_page: Option<LinkedPageView>,
    media: Vec<MediaView>,
}

#[derive(Serialize)]
struct LinkedPageView {
    url: String,
    title: String,
    /// Escaped, then split into paragraphs.
    description: String,
}

#[derive(Serialize)]
struct MediaView {
    is_video: bool,
    link: String,
    src: Option<String>,
    width: u32,
    height: u32,
    duration: String,
}

/// The digest page template, registered once and reused per render.
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(|s| encode_quoted_attribute(s).into_owned());
        handlebars.register_template_string(PAGE_TEMPLATE, PAGE)?;
        Ok(Self { handlebars })
    }

    /// Render the digest with times shown in the local time zone.
    pub fn render(&self, items: &[Item]) -> Result<String> {
        self.render_in(items, &Local)
    }

    pub fn render_in<Tz>(&self, items: &[Item], tz: &Tz) -> Result<String>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        let page = PageView {
            items: items.iter().map(|item| item_view(item, tz)).collect(),
        };
        Ok(self.handlebars.render(PAGE_TEMPLATE, &page)?)
    }
}

/// Wrap each non-empty line in a paragraph.
pub fn paragraphs(text: &str) -> String {
    text.split('\n')
        .filter(|line| !line.is_empty())
        .map(|line| format!("<p>{}</p>\n", line))
        .collect()
}

fn item_view<Tz>(item: &Item, tz: &Tz) -> ItemView
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let local = item.timestamp.with_timezone(tz);
    let channel = item.attribution();

    ItemView {
        message_id: item.message_id,
        permalink: item.permalink(),
        time: local.format("%H:%M").to_string(),
        date: local.format("%-d %b").to_string(),
        forwarded: item.is_forwarded(),
        domain: channel.domain.clone(),
        title: channel.title.clone(),
        text: paragraphs(&item.text),
        linked_page: item.linked_page.as_ref().map(|page| LinkedPageView {
            url: page.url.clone(),
            title: page.title.clone(),
            description: paragraphs(&encode_text(&page.description)),
        }),
        media: item.media.iter().map(media_view).collect(),
    }
}

fn media_view(media: &Media) -> MediaView {
    MediaView {
        is_video: media.is_video,
        link: media.permalink.clone(),
        src: image_source(media),
        width: media.width,
        height: media.height,
        duration: media.duration.clone().unwrap_or_default(),
    }
}

/// Inline data when embedded, otherwise a link to the cached file.
fn image_source(media: &Media) -> Option<String> {
    if let Some(encoded) = &media.thumbnail_base64 {
        return Some(format!("data:image/jpeg;base64,{}", encoded));
    }
    media
        .thumbnail_path
        .as_ref()
        .map(|path| format!("file://{}", path.to_string_lossy()))
}
