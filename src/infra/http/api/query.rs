//! Query-string decoding for the catalog endpoint.
//!
//! `tag=1,3`, `tag=1&tag=3`, `tag[]=1&tag[]=3` and `tag[0]=1&tag[1]=3` all
//! decode to the same dimension. A single plain occurrence stays a scalar so
//! the normalizer can comma-split it.

use std::collections::HashMap;

use crate::domain::filter::{RawFilterValue, RawTranslationQuery};

#[derive(Default)]
struct Collected {
    values: Vec<String>,
    bracketed: bool,
}

impl Collected {
    fn into_raw(self) -> RawFilterValue {
        if !self.bracketed && self.values.len() == 1 {
            let mut values = self.values;
            RawFilterValue::Scalar(values.remove(0))
        } else {
            RawFilterValue::List(self.values)
        }
    }
}

pub fn parse_translation_query(raw: Option<&str>) -> RawTranslationQuery {
    let mut collected: HashMap<String, Collected> = HashMap::new();

    for (name, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
        let (base, bracketed) = match name.find('[') {
            Some(index) => (&name[..index], true),
            None => (&name[..], false),
        };
        let entry = collected.entry(base.to_string()).or_default();
        entry.bracketed |= bracketed;
        entry.values.push(value.into_owned());
    }

    let mut take = |name: &str| collected.remove(name).map(Collected::into_raw);

    RawTranslationQuery {
        locale: take("locale"),
        tag: take("tag"),
        key: take("key"),
        content: take("content"),
        format: take("format"),
    }
}
