/// An RSS 2.0 document, reduced to the fields the aggregator reports.
#[derive(Debug, Clone, PartialEq)]
pub struct RssFeed {
    pub channel: RssChannel,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssChannel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub items: Vec<RssItem>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub pub_date: Option<String>,
}

impl From<rss::Channel> for RssFeed {
    fn from(channel: rss::Channel) -> Self {
        let items = channel
            .items()
            .iter()
            .map(|item| RssItem {
                title: item.title().unwrap_or_default().to_string(),
                link: item.link().unwrap_or_default().to_string(),
                description: item.description().unwrap_or_default().to_string(),
                pub_date: item.pub_date().map(str::to_string),
            })
            .collect();

        RssFeed {
            channel: RssChannel {
                title: channel.title().to_string(),
                link: channel.link().to_string(),
                description: channel.description().to_string(),
                items,
            },
        }
    }
}

/// Parse an RSS body and HTML-unescape its text fields.
///
/// Only unprefixed RSS elements fill the model. Namespaced siblings such as
/// `atom:link`, `dc:creator` or `media:description` are extensions and never
/// shadow `link` or `description`. A body that is not XML, or XML without a
/// `<channel>`, is an error rather than an empty feed.
///
/// Entity handling happens in two passes: the XML reader resolves the five
/// builtins, then [`unescape_html`] decodes HTML entities that feeds commonly
/// double-escape (`&amp;rsquo;` → `&rsquo;` → `’`).
pub fn parse_feed(bytes: &[u8]) -> Result<RssFeed, rss::Error> {
    let channel = rss::Channel::read_from(bytes)?;
    let mut feed = RssFeed::from(channel);
    unescape_html(&mut feed);
    Ok(feed)
}

/// Decode HTML entities in channel and item titles/descriptions, in place.
pub fn unescape_html(feed: &mut RssFeed) {
    let channel = &mut feed.channel;
    decode_in_place(&mut channel.title);
    decode_in_place(&mut channel.description);
    for item in &mut channel.items {
        decode_in_place(&mut item.title);
        decode_in_place(&mut item.description);
    }
}

fn decode_in_place(text: &mut String) {
    if !text.contains('&') {
        return;
    }
    let decoded = html_escape::decode_html_entities(text.as_str()).into_owned();
    *text = decoded;
}
