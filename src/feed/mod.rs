//! RSS 2.0 feed rendering

use chrono::{DateTime, Utc};

use crate::config::SiteConfig;
use crate::content::Post;

/// Content type served with the feed
pub const CONTENT_TYPE: &str = "application/xml";

/// Format used for `pubDate` and `lastBuildDate` (RFC 822 / HTTP date)
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Render the feed with the current time as build date
pub fn render_feed(posts: &[Post], site: &SiteConfig) -> String {
    render_rss(posts, site, Utc::now())
}

/// Render an RSS 2.0 document for `posts`.
///
/// `now` only feeds `lastBuildDate`; everything else depends on the inputs.
pub fn render_rss(posts: &[Post], site: &SiteConfig, now: DateTime<Utc>) -> String {
    let site_url = site.site_url();

    let mut feed = String::new();
    feed.push_str(r#"<?xml version="1.0" encoding="UTF-8" ?>"#);
    feed.push('\n');
    feed.push_str(r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">"#);
    feed.push('\n');
    feed.push_str("  <channel>\n");
    feed.push_str(&format!("    <title>{}</title>\n", escape_xml(&site.title)));
    feed.push_str(&format!(
        "    <description>{}</description>\n",
        escape_xml(&site.description)
    ));
    feed.push_str(&format!("    <link>{}</link>\n", escape_xml(site_url)));
    feed.push_str(&format!(
        "    <atom:link href=\"{}/{}\" rel=\"self\" type=\"application/rss+xml\" />\n",
        escape_xml(site_url),
        escape_xml(site.feed.path.trim_start_matches('/'))
    ));
    feed.push_str(&format!(
        "    <lastBuildDate>{}</lastBuildDate>\n",
        now.format(HTTP_DATE)
    ));
    feed.push_str(&format!(
        "    <language>{}</language>\n",
        escape_xml(&site.language)
    ));

    for post in posts {
        let link = escape_xml(&format!("{}{}", site_url, post.link));

        feed.push_str("    <item>\n");
        feed.push_str(&format!("      <title>{}</title>\n", cdata(&post.title)));
        feed.push_str(&format!(
            "      <description>{}</description>\n",
            cdata(&post.description)
        ));
        feed.push_str(&format!("      <link>{}</link>\n", link));
        feed.push_str(&format!("      <guid>{}</guid>\n", link));
        if let Some(date) = post.published_date() {
            feed.push_str(&format!(
                "      <pubDate>{}</pubDate>\n",
                date.format(HTTP_DATE)
            ));
        }
        if let Some(author) = &post.author {
            feed.push_str(&format!("      <author>{}</author>\n", escape_xml(author)));
        }
        for tag in &post.tags {
            feed.push_str(&format!("      <category>{}</category>\n", escape_xml(tag)));
        }
        feed.push_str("    </item>\n");
    }

    feed.push_str("  </channel>\n");
    feed.push_str("</rss>\n");

    feed
}

/// Wrap text in a CDATA section, splitting any `]]>` it contains
fn cdata(s: &str) -> String {
    let clean = strip_invalid_xml_chars(s);
    format!("<![CDATA[{}]]>", clean.replace("]]>", "]]]]><![CDATA[>"))
}

/// Escape XML special characters
fn escape_xml(s: &str) -> String {
    strip_invalid_xml_chars(s)
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Strip invalid XML control characters (except tab, newline, carriage return)
/// XML 1.0 only allows: #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn site() -> SiteConfig {
        SiteConfig {
            title: "Yan & Co".to_string(),
            url: "https://example.com/".to_string(),
            ..SiteConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 1, 12, 0, 0).unwrap()
    }

    fn post(content: &str, slug: &str) -> Post {
        Post::extract(slug, content, 200).unwrap()
    }

    #[test]
    fn test_empty_feed_is_well_formed() {
        let xml = render_rss(&[], &site(), now());
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<title>Yan &amp; Co</title>"));
        assert!(xml.contains("<link>https://example.com</link>"));
        assert!(xml.contains(r#"<atom:link href="https://example.com/rss.xml""#));
        assert!(xml.contains("<lastBuildDate>Mon, 01 Jul 2024 12:00:00 GMT</lastBuildDate>"));
        assert!(!xml.contains("<item>"));
        assert!(xml.trim_end().ends_with("</rss>"));
    }

    #[test]
    fn test_item_fields() {
        let posts = vec![post(
            "---\ntitle: \"Tips & <Tricks>\"\ndescription: \"Ends with ]]> oops\"\npublishedAt: 2024-01-01\nauthor: Yan <y@example.com>\ntags: [rust, \"a&b\"]\n---\nbody\n",
            "tips",
        )];
        let xml = render_rss(&posts, &site(), now());

        assert!(xml.contains("<title><![CDATA[Tips & <Tricks>]]></title>"));
        assert!(xml.contains(
            "<description><![CDATA[Ends with ]]]]><![CDATA[> oops]]></description>"
        ));
        assert!(xml.contains("<link>https://example.com/blog/tips</link>"));
        assert!(xml.contains("<guid>https://example.com/blog/tips</guid>"));
        assert!(xml.contains("<pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>"));
        assert!(xml.contains("<author>Yan &lt;y@example.com&gt;</author>"));
        assert!(xml.contains("<category>rust</category>"));
        assert!(xml.contains("<category>a&amp;b</category>"));
    }

    #[test]
    fn test_items_follow_input_order() {
        let posts = vec![
            post("---\ntitle: Newer\npublishedAt: 2024-06-01\n---\n", "newer"),
            post("---\ntitle: Older\npublishedAt: 2024-01-01\n---\n", "older"),
        ];
        let xml = render_rss(&posts, &site(), now());
        let newer = xml.find("Newer").unwrap();
        let older = xml.find("Older").unwrap();
        assert!(newer < older);
        assert_eq!(xml.matches("<item>").count(), 2);
    }

    #[test]
    fn test_only_build_date_varies() {
        let posts = vec![post("---\ntitle: A\npublishedAt: 2024-01-01\n---\n", "a")];
        let later = now() + chrono::Duration::hours(5);
        let first = render_rss(&posts, &site(), now());
        let second = render_rss(&posts, &site(), later);
        assert_ne!(first, second);

        let strip = |xml: &str| {
            xml.lines()
                .filter(|l| !l.contains("lastBuildDate"))
                .collect::<Vec<_>>()
                .join("\n")
        };
        assert_eq!(strip(&first), strip(&second));
    }

    #[test]
    fn test_invalid_xml_chars_are_stripped() {
        assert_eq!(cdata("a\u{0001}b"), "<![CDATA[ab]]>");
        assert_eq!(escape_xml("x\u{000B}<"), "x&lt;");
    }
}
