#[cfg(test)]
mod tests {
    use holdfast_core::*;
    use insta::assert_snapshot;

    use crate::Inspector;

    fn sample() -> (Container, Provider<u32>, Provider<u32>) {
        let config = Provider::new("config", |_| Ok(1u32));
        let cache = Provider::auto_dispose("cache", {
            let config = config.clone();
            move |ctx| {
                ctx.set_maintain_state(true);
                Ok(*ctx.watch(&config)? + 1)
            }
        });
        let container = Container::with_config(
            ContainerConfig::default()
                .named("app")
                .with_log_observer(false),
        );
        (container, config, cache)
    }

    #[test]
    fn test_report_before_capture_is_empty() {
        let inspector = Inspector::new();
        assert_eq!(inspector.report(), "");
        assert_eq!(inspector.capture_count(), 0);
        assert!(inspector.last().is_none());
    }

    #[test]
    fn test_report_lists_instances() {
        let (container, _config, cache) = sample();
        let sub = container.listen(&cache).unwrap();

        let mut inspector = Inspector::new();
        inspector.capture(&container);
        assert_snapshot!(inspector.report(), @r"
        container: app  |  captures: 1  |  live: 2  |  pending: 0
        config [keep-alive] Active listeners=1 maintain=false deps=-
        cache [auto-dispose] Active listeners=1 maintain=true deps=config
        ");

        drop(sub);
        inspector.capture(&container);
        assert_snapshot!(inspector.report(), @r"
        container: app  |  captures: 2  |  live: 2  |  pending: 1
        config [keep-alive] Active listeners=1 maintain=false deps=-
        cache [auto-dispose] PendingDisposal listeners=0 maintain=true deps=config
        ");

        let metrics = inspector.metrics.unwrap();
        assert_eq!(metrics.listeners, 1);
        assert!(metrics.since_last_ms.is_some());
    }

    #[test]
    fn test_report_after_dispose() {
        let (container, config, _cache) = sample();
        container.read(&config).unwrap();
        container.dispose();

        let mut inspector = Inspector::new();
        let snapshot = inspector.capture(&container);
        assert!(snapshot.instances.is_empty());
        assert_snapshot!(inspector.report(), @"container: app  |  captures: 1  |  live: 0  |  pending: 0  |  disposed");
    }

    #[test]
    fn test_to_json_carries_instance_fields() {
        let (container, _config, cache) = sample();
        let _sub = container.listen(&cache).unwrap();

        let mut inspector = Inspector::new();
        inspector.capture(&container);
        let json: serde_json::Value = serde_json::from_str(&inspector.to_json().unwrap()).unwrap();

        assert_eq!(json["container"], "app");
        let instances = json["instances"].as_array().unwrap();
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1]["provider"], "cache");
        assert_eq!(instances[1]["lifetime"], "AutoDispose");
        assert_eq!(instances[1]["state"], "Active");
        assert_eq!(instances[1]["dependencies"][0], "config");
        assert_eq!(instances[1]["maintain_state"], true);
    }

    #[test]
    fn test_live_count_includes_instances_still_building() {
        let config = Provider::new("config", |_| Ok(1u32));
        let container = Container::with_config(ContainerConfig::default().with_log_observer(false));
        let loader = Provider::new("loader", {
            let config = config.clone();
            let container = container.clone();
            move |ctx| {
                ctx.watch(&config)?;
                let mut inspector = Inspector::new();
                inspector.capture(&container);
                let live = inspector.metrics.map(|m| m.live);
                Ok((live, container.live_count()))
            }
        });

        let seen = container.read(&loader).unwrap();
        assert_eq!(*seen, (Some(2), 2));
    }

    #[test]
    fn test_ages_are_opt_in() {
        let (container, config, _cache) = sample();
        container.read(&config).unwrap();

        let mut inspector = Inspector::new();
        inspector.capture(&container);
        assert!(!inspector.report().contains("age="));

        inspector.show_ages = true;
        assert!(inspector.report().contains(" age="));
    }
}
