use serde::Serialize;
use utoipa::ToSchema;

/// Page metadata attached to list responses. Single-object and action
/// responses carry the empty form, with all fields null.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    pub fn empty() -> Self {
        Self {
            page: None,
            per_page: None,
            total: None,
        }
    }
}

/// Envelope for every JSON endpoint. The one exception is the shopping-list
/// download, which returns a plain-text attachment instead.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginated_meta_serializes_all_fields() {
        let meta = Meta::new(2, 6, 13);
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "page": 2, "per_page": 6, "total": 13 })
        );
    }

    #[test]
    fn empty_meta_serializes_nulls() {
        let json = serde_json::to_value(Meta::empty()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "page": null, "per_page": null, "total": null })
        );
    }

    #[test]
    fn success_envelope_carries_message_and_data() {
        let resp = ApiResponse::success("OK", serde_json::json!({ "id": 1 }), None);
        assert_eq!(resp.message, "OK");
        assert_eq!(resp.data, Some(serde_json::json!({ "id": 1 })));
        assert!(resp.meta.is_none());
    }
}
