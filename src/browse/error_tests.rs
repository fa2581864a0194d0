//! Unit tests for browse error types

#[cfg(test)]
mod tests {
    use crate::browse::error::BrowseError;
    use crate::catalog::CatalogError;
    use crate::session::StorageError;
    use std::error::Error;

    #[test]
    fn test_not_found_display() {
        let error = BrowseError::NotFound("737628064502".to_string());
        assert_eq!(error.to_string(), "No product found for barcode 737628064502");
    }

    #[test]
    fn test_busy_display() {
        assert_eq!(BrowseError::Busy.to_string(), "A load is already in progress");
    }

    #[test]
    fn test_transport_from_catalog_error() {
        let error: BrowseError = CatalogError::Request("offline".to_string()).into();
        assert!(matches!(error, BrowseError::Transport(_)));
        assert!(error.to_string().contains("offline"));
    }

    #[test]
    fn test_storage_from_storage_error() {
        let error: BrowseError = StorageError::Corrupt("bad".to_string()).into();
        assert!(matches!(error, BrowseError::Storage(_)));
    }

    #[test]
    fn test_error_source() {
        assert!(BrowseError::Busy.source().is_none());
        assert!(BrowseError::InvalidInput("x".to_string()).source().is_none());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<BrowseError>();
    }
}
