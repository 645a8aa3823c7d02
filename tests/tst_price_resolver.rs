mod common;

use common::FakeProvider;
use covered_call_screener::screener::{PriceMode, PriceResolver, ScreenerError, TtlCache};
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    fn forbidden(context: &str) -> ScreenerError {
        ScreenerError::Authorization(format!(
            "403 {} (XYZ): NOT_AUTHORIZED (Plan may not include realtime data)",
            context
        ))
    }

    #[tokio::test]
    async fn test_auto_falls_through_to_previous_close() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("XYZ", Err(forbidden("fetching last trade")))
                .snapshot("XYZ", Err(ScreenerError::Data("Snapshot endpoint returned no price for XYZ.".into())))
                .previous_close("XYZ", Ok(50.0)),
        );
        let resolver = PriceResolver::new(Arc::clone(&provider));

        assert_eq!(resolver.resolve_price("xyz", PriceMode::Auto).await, Ok(50.0));
        assert_eq!(
            provider.calls(),
            vec!["last_trade:XYZ", "snapshot:XYZ", "previous_close:XYZ"]
        );
    }

    #[tokio::test]
    async fn test_first_positive_stage_wins() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("AAPL", Ok(190.25))
                .previous_close("AAPL", Ok(188.0)),
        );
        let resolver = PriceResolver::new(Arc::clone(&provider));

        assert_eq!(resolver.resolve_price("AAPL", PriceMode::Auto).await, Ok(190.25));
        assert_eq!(provider.calls(), vec!["last_trade:AAPL"]);
    }

    #[tokio::test]
    async fn test_non_positive_price_falls_through() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("AAPL", Ok(0.0))
                .snapshot("AAPL", Ok(-1.0))
                .previous_close("AAPL", Ok(188.0)),
        );
        let resolver = PriceResolver::new(provider);

        assert_eq!(resolver.resolve_price("AAPL", PriceMode::Auto).await, Ok(188.0));
    }

    #[tokio::test]
    async fn test_previous_close_mode_skips_realtime() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("MSFT", Ok(400.0))
                .previous_close("MSFT", Ok(395.5)),
        );
        let resolver = PriceResolver::new(Arc::clone(&provider));

        assert_eq!(resolver.resolve_price("MSFT", PriceMode::PreviousClose).await, Ok(395.5));
        assert_eq!(provider.calls(), vec!["previous_close:MSFT"]);
    }

    #[tokio::test]
    async fn test_all_stages_fail_reports_last_stage() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("XYZ", Err(forbidden("fetching last trade")))
                .snapshot("XYZ", Err(forbidden("snapshot")))
                .previous_close(
                    "XYZ",
                    Err(ScreenerError::Http { status: 500, message: "HTTP 500 previous close (XYZ).".into() }),
                ),
        );
        let resolver = PriceResolver::new(provider);

        let err = resolver.resolve_price("XYZ", PriceMode::Auto).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 500 previous close (XYZ).");
    }

    #[tokio::test]
    async fn test_earlier_auth_failure_does_not_mask_last_stage() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("XYZ", Err(ScreenerError::Authentication("401 fetching last trade (XYZ): Unknown API Key".into())))
                .snapshot("XYZ", Err(ScreenerError::Network("Network error snapshot (XYZ).".into())))
                .previous_close("XYZ", Err(ScreenerError::NoData("Previous close not found for XYZ.".into()))),
        );
        let resolver = PriceResolver::new(provider);

        let err = resolver.resolve_price("XYZ", PriceMode::Auto).await.unwrap_err();
        assert_eq!(err, ScreenerError::NoData("Previous close not found for XYZ.".into()));
    }

    #[tokio::test]
    async fn test_previous_close_only_failure_surfaces_its_error() {
        let provider = Arc::new(
            FakeProvider::new()
                .previous_close("XYZ", Err(ScreenerError::NoData("Previous close not found for XYZ.".into()))),
        );
        let resolver = PriceResolver::new(provider);

        let err = resolver.resolve_price("XYZ", PriceMode::PreviousClose).await.unwrap_err();
        assert_eq!(err.to_string(), "Previous close not found for XYZ.");
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_lookups() {
        let provider = Arc::new(FakeProvider::new().last_trade("AAPL", Ok(190.0)));
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let resolver = PriceResolver::with_cache(Arc::clone(&provider), cache);

        assert_eq!(resolver.resolve_price("AAPL", PriceMode::Auto).await, Ok(190.0));
        assert_eq!(resolver.resolve_price("aapl", PriceMode::Auto).await, Ok(190.0));
        assert_eq!(provider.calls_for("AAPL"), 1);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_mode_and_skips_failures() {
        let provider = Arc::new(
            FakeProvider::new()
                .last_trade("AAPL", Ok(190.0))
                .previous_close("AAPL", Ok(188.0)),
        );
        let cache = Arc::new(TtlCache::new(Duration::from_secs(60)));
        let resolver = PriceResolver::with_cache(Arc::clone(&provider), Arc::clone(&cache));

        assert_eq!(resolver.resolve_price("AAPL", PriceMode::Auto).await, Ok(190.0));
        assert_eq!(resolver.resolve_price("AAPL", PriceMode::PreviousClose).await, Ok(188.0));
        assert_eq!(cache.len().await, 2);

        assert!(resolver.resolve_price("NOPE", PriceMode::PreviousClose).await.is_err());
        assert!(resolver.resolve_price("NOPE", PriceMode::PreviousClose).await.is_err());
        assert_eq!(provider.calls_for("NOPE"), 2);
        assert_eq!(cache.len().await, 2);
    }
}
