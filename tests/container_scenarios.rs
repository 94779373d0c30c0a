//! End-to-end scenarios wiring an application out of a container

use async_trait::async_trait;
use parking_lot::Mutex;
use rivet_di::intercept::{
    async_handler, sync_handler, InterceptError, Invocable, Matcher, MethodInfo,
};
use rivet_di::*;
use rivet_graph::Graph;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

struct Settings {
    greeting: String,
}

#[derive(Default)]
struct Store {
    entries: Mutex<Vec<String>>,
}

impl Component for Store {
    fn describe(info: TypeInfoBuilder) -> TypeInfoBuilder {
        info.construct(|_| Ok(Instance::new(Store::default())))
    }
}

struct Greeter {
    settings: Arc<Settings>,
    store: Arc<Store>,
}

impl Component for Greeter {
    fn describe(info: TypeInfoBuilder) -> TypeInfoBuilder {
        info.param("settings", "Settings")
            .param("store", "Store")
            .construct(|args| {
                Ok(Instance::invocable(Greeter {
                    settings: args.get::<Settings>(0)?,
                    store: args.get::<Store>(1)?,
                }))
            })
    }
}

#[async_trait]
impl Invocable for Greeter {
    fn methods(&self) -> Vec<MethodInfo> {
        vec![MethodInfo::new("greet"), MethodInfo::sealed("history")]
    }

    fn call_sync(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        match method {
            "greet" => {
                let name = args.first().and_then(Value::as_str).unwrap_or("stranger");
                let line = format!("{}, {}", self.settings.greeting, name);
                self.store.entries.lock().push(line.clone());
                Ok(json!(line))
            }
            "history" => Ok(json!(self.store.entries.lock().len())),
            other => Err(InterceptError::unknown_method::<Self>(other)),
        }
    }

    async fn call(&self, method: &str, args: Vec<Value>) -> anyhow::Result<Value> {
        tokio::task::yield_now().await;
        self.call_sync(method, args)
    }
}

/// Settings, a store shared through an external object store, and a greeter
fn application(objects: Arc<ObjectManager>) -> DIResult<Container> {
    init_tracing();
    let container = Container::builder()
        .config(ContainerConfig {
            name: "app".to_string(),
            ..ContainerConfig::default()
        })
        .build()?;

    container
        .register_instance(
            Instance::new(Settings {
                greeting: "Hello".to_string(),
            }),
            "Settings",
        )?
        .register_type_with::<Store>(
            RegistrationOptions::new().lifetime(ExternalLifetime::new("store", objects)),
        )?
        .register_type::<Greeter>()?;
    Ok(container)
}

#[test]
fn test_dependency_plan_matches_container_graph() {
    let objects = Arc::new(ObjectManager::new());
    let container = application(objects).unwrap();

    let mut plan = Graph::new();
    for key in container.keys() {
        plan.add(&key, container.dependencies_of(&key));
    }
    assert!(!plan.has_cycle());

    let mut reachable = plan.descendants("Greeter");
    reachable.sort();
    assert_eq!(reachable, vec!["Settings", "Store"]);

    // an edge back into the greeter would be refused
    let err = plan
        .add_and_verify("Settings", ["Greeter"])
        .unwrap_err()
        .to_string();
    assert!(
        err.contains("Greeter -> Settings -> Greeter")
            || err.contains("Settings -> Greeter -> Settings"),
        "unexpected message: {}",
        err
    );
    assert_eq!(plan.successors("Settings"), Vec::<String>::new());
    assert!(container.graph_dot().contains("Greeter -> Store"));
}

#[test]
fn test_external_store_survives_until_purged() {
    let objects = Arc::new(ObjectManager::new());
    let container = application(objects.clone()).unwrap();

    let first = container.resolve_sync("Greeter").unwrap();
    first.call_sync("greet", vec![json!("Ada")]).unwrap();
    assert_eq!(objects.len(), 1);

    let second = container.resolve_sync("Greeter").unwrap();
    assert!(!first.ptr_eq(&second));
    assert_eq!(second.call_sync("history", vec![]).unwrap(), json!(1));

    objects.purge();
    let fresh = container.resolve_sync("Greeter").unwrap();
    assert_eq!(fresh.call_sync("history", vec![]).unwrap(), json!(0));
}

#[tokio::test]
async fn test_audited_calls_across_request_containers() {
    let objects = Arc::new(ObjectManager::new());
    let app = application(objects).unwrap();

    let audit = Arc::new(Mutex::new(Vec::new()));
    let log = audit.clone();
    app.intercept(Matcher::for_type::<Greeter>()).asynchronous([async_handler(
        move |ctx, next| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().push(ctx.method_name.clone());
                next.run(ctx).await;
            })
        },
    )]);
    // build the shared store once so concurrent requests cannot race to create it
    app.resolve("Store").await.unwrap();

    let mut handles = Vec::new();
    for name in ["Ada", "Grace", "Linus"] {
        let request = app.create_child();
        handles.push(tokio::spawn(async move {
            let greeter = request.resolve("Greeter").await?;
            let line = greeter
                .call("greet", vec![json!(name)])
                .await
                .map_err(DIError::from)?;
            info!(%line, "request handled");
            Ok::<_, DIError>(line)
        }));
    }

    let mut lines = Vec::new();
    for handle in handles {
        lines.push(handle.await.unwrap().unwrap());
    }
    lines.sort_by(|a, b| a.as_str().cmp(&b.as_str()));
    assert_eq!(
        lines,
        vec![json!("Hello, Ada"), json!("Hello, Grace"), json!("Hello, Linus")]
    );

    // every request shared the one external store, and the sealed method was not audited
    let greeter = app.resolve("Greeter").await.unwrap();
    assert_eq!(greeter.call("history", vec![]).await.unwrap(), json!(3));
    assert_eq!(audit.lock().as_slice(), ["greet", "greet", "greet"]);
}

#[test]
fn test_events_describe_a_resolution() {
    let objects = Arc::new(ObjectManager::new());
    let app = application(objects).unwrap();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    app.subscribe(move |event: &ContainerEvent| {
        let label = match event {
            ContainerEvent::Resolving { key } => format!("resolving {}", key),
            ContainerEvent::Built { type_info, .. } => format!("built {}", type_info.name()),
            ContainerEvent::Intercepting { method, .. } => format!("intercepting {}", method),
            other => other.name().to_string(),
        };
        sink.lock().push(label);
    });

    app.intercept("greet").sync([sync_handler(|ctx, next| next.run(ctx))]);
    let greeter = app.resolve_sync("Greeter").unwrap();
    greeter.call_sync("greet", vec![json!("Ada")]).unwrap();

    let seen = seen.lock();
    let position = |label: &str| seen.iter().position(|l| l == label);
    assert!(position("resolving Greeter") < position("resolving Settings"));
    assert!(position("built Store") < position("built Greeter"));
    assert_eq!(seen.last().map(String::as_str), Some("intercepting greet"));
}

#[test]
fn test_missing_setting_explains_chain() {
    init_tracing();
    let container = Container::new();
    container.register_type::<Store>().unwrap();
    container.register_type::<Greeter>().unwrap();

    let err = container.resolve_sync("Greeter").unwrap_err();
    assert_eq!(
        err.to_string(),
        "Nothing with key \"Settings\" is registered in the container; \
         error occurred while resolving \"Greeter\" -> \"Settings\""
    );
}
