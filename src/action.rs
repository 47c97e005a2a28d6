use http::StatusCode;
use url::Url;

use crate::types::Link;

/// Handle for a server-side asynchronous operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationRef {
    /// Opaque operation id; may be empty when the server link carried none.
    pub id: String,
    pub href: String,
}

/// Outcome of an action endpoint, discriminating synchronous completion
/// from a 202 with an operation handle to poll.
#[derive(Clone, Debug)]
pub struct ActionResult {
    pub status: StatusCode,
    pub operation: Option<OperationRef>,
    pub link: Option<Link>,
}

/// Extracts an operation reference from a server link.
///
/// The id comes from the `id` query parameter when present, otherwise from
/// the final path segment (trailing slashes stripped). A href that does not
/// parse as a URL yields a reference with the original href and no id.
pub(crate) fn operation_ref_from_link(link: &Link) -> Option<OperationRef> {
    if link.href.is_empty() {
        return None;
    }
    let Ok(parsed) = Url::parse(&link.href) else {
        return Some(OperationRef {
            id: String::new(),
            href: link.href.clone(),
        });
    };

    let mut id = parsed
        .query_pairs()
        .find(|(key, _)| key == "id")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    if id.is_empty() {
        let last_segment = parsed
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        id = last_segment
            .strip_prefix("operations/")
            .unwrap_or(last_segment)
            .to_owned();
    }

    Some(OperationRef {
        id,
        href: link.href.clone(),
    })
}

pub(crate) fn action_from_status(status: StatusCode, link: Link) -> ActionResult {
    let operation = if status == StatusCode::ACCEPTED {
        operation_ref_from_link(&link)
    } else {
        None
    };
    ActionResult {
        status,
        operation,
        link: Some(link),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(href: &str) -> Link {
        Link {
            href: href.to_owned(),
            ..Link::default()
        }
    }

    #[test]
    fn extracts_id_from_query_parameter() {
        let reference = operation_ref_from_link(&link(
            "https://cloud-api.yandex.net/v1/disk/operations?id=abc",
        ))
        .expect("href is non-empty");
        assert_eq!(reference.id, "abc");
        assert_eq!(
            reference.href,
            "https://cloud-api.yandex.net/v1/disk/operations?id=abc"
        );
    }

    #[test]
    fn extracts_id_from_final_path_segment() {
        let reference = operation_ref_from_link(&link(
            "https://cloud-api.yandex.net/v1/disk/operations/op-7/",
        ))
        .expect("href is non-empty");
        assert_eq!(reference.id, "op-7");
    }

    #[test]
    fn malformed_href_yields_reference_without_id() {
        let reference =
            operation_ref_from_link(&link("not a url")).expect("href is non-empty");
        assert_eq!(reference.id, "");
        assert_eq!(reference.href, "not a url");
    }

    #[test]
    fn empty_href_yields_no_reference() {
        assert_eq!(operation_ref_from_link(&Link::default()), None);
    }

    #[test]
    fn only_accepted_status_carries_an_operation() {
        let accepted = action_from_status(
            StatusCode::ACCEPTED,
            link("https://cloud-api.yandex.net/v1/disk/operations?id=abc"),
        );
        assert_eq!(
            accepted.operation.expect("202 should have an operation").id,
            "abc"
        );

        let created = action_from_status(StatusCode::CREATED, link("https://x.test/l"));
        assert!(created.operation.is_none());
        assert!(created.link.is_some());
    }
}
