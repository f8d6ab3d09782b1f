use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use vista::{AfterRender, AppInfo, BeforeRender, RenderActionExt, RenderOptions, TemplateSource, Vista};
use vista_dispatch::{Action, Dispatcher, Intent, IntentError};

fn setup(options: RenderOptions) -> (tempfile::TempDir, Vista, Dispatcher) {
    let dir = tempfile::tempdir().unwrap();
    let vista = Vista::new(&AppInfo::new("demo").root(dir.path()), options);
    let mut dispatcher = Dispatcher::new();
    vista.install(&mut dispatcher);
    (dir, vista, dispatcher)
}

fn write_view(vista: &Vista, name: &str, contents: &str) {
    let path = vista.renderer().view_root().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn failing(status: u16) -> impl Fn(&mut Intent) -> anyhow::Result<()> + Send + Sync + 'static {
    move |_| Err(IntentError::new("TEST.FAIL", "failed").with_status(status).into())
}

// 404 and generic error rules: status match first, then the generic rule
#[tokio::test]
async fn test_status_and_generic_error_pages() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "404.html", "not found page");
    write_view(&vista, "error.html", "error page");

    for status in [404u16, 500, 403] {
        dispatcher.add_action(
            Action::new(format!("fail.{}", status))
                .handle(failing(status))
                .render_when("404.html", 404)
                .render_when("error.html", "error"),
        );
    }

    let r404 = dispatcher.dispatch("fail.404", json!(null)).await.unwrap();
    assert_eq!(r404.status, 200);
    assert_eq!(r404.as_html(), Some("not found page"));

    let r500 = dispatcher.dispatch("fail.500", json!(null)).await.unwrap();
    assert_eq!(r500.as_html(), Some("error page"));

    let r403 = dispatcher.dispatch("fail.403", json!(null)).await.unwrap();
    assert_eq!(r403.as_html(), Some("error page"));
}

// Without a generic rule an unmatched error keeps its JSON response
#[tokio::test]
async fn test_unmatched_error_passes_through() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "404.html", "nf");
    dispatcher.add_action(
        Action::new("fail")
            .handle(failing(409))
            .render_when("404.html", 404),
    );

    let response = dispatcher.dispatch("fail", json!(null)).await.unwrap();
    assert_eq!(response.status, 409);
    assert_eq!(response.as_json().unwrap()["error"]["code"], "TEST.FAIL");
}

// Success with MiniJinja sees the intent and the app identity
#[tokio::test]
async fn test_success_renders_template_with_intent() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(
        &vista,
        "users/show.jinja",
        "{{ app.name }}: {{ intent.result.name }} ({{ intent.input.id }})",
    );
    dispatcher.add_action(
        Action::new("users.show")
            .handle(|intent| {
                intent.set_result(json!({"name": "ada"}));
                Ok(())
            })
            .render_when("users/show.jinja", "success"),
    );

    let response = dispatcher.dispatch("users.show", json!({"id": 7})).await.unwrap();
    assert_eq!(response.as_html(), Some("demo: ada (7)"));
    assert_eq!(response.content_type(), "text/html; charset=utf-8");
}

// The always rule covers both outcomes
#[tokio::test]
async fn test_all_rule_covers_success_and_error() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(
        &vista,
        "page.jinja",
        "{% if intent.error %}E{{ intent.error.status }}{% else %}OK{% endif %}",
    );
    dispatcher.add_action(Action::new("ok").render("page.jinja"));
    dispatcher.add_action(Action::new("ko").handle(failing(503)).render("page.jinja"));

    let ok = dispatcher.dispatch("ok", json!(null)).await.unwrap();
    assert_eq!(ok.as_html(), Some("OK"));

    let ko = dispatcher.dispatch("ko", json!(null)).await.unwrap();
    assert_eq!(ko.as_html(), Some("E503"));
    assert_eq!(ko.status, 200);
}

// A raw result set by a handler is never replaced
#[tokio::test]
async fn test_raw_result_skips_rendering() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "page.html", "page");

    let before_calls = Arc::new(Mutex::new(0));
    let before_clone = before_calls.clone();
    dispatcher.add_action(
        Action::new("raw")
            .handle(|intent| {
                intent.set_raw_result("<p>handmade</p>");
                Ok(())
            })
            .render("page.html")
            .before_render(move |_, _| *before_clone.lock().unwrap() += 1),
    );

    let response = dispatcher.dispatch("raw", json!(null)).await.unwrap();
    assert_eq!(response.as_html(), Some("<p>handmade</p>"));
    assert_eq!(*before_calls.lock().unwrap(), 0);
}

// A panicking dynamic rule behaves like "no template"
#[tokio::test]
async fn test_panicking_dynamic_rule_falls_back() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "fallback.html", "fallback");
    dispatcher.add_action(
        Action::new("dyn")
            .render_when(TemplateSource::dynamic(|_| panic!("rule bug")), "success")
            .render("fallback.html"),
    );
    dispatcher.add_action(
        Action::new("dyn.only").render(TemplateSource::dynamic(|_| panic!("rule bug"))),
    );

    let response = dispatcher.dispatch("dyn", json!(null)).await.unwrap();
    assert_eq!(response.as_html(), Some("fallback"));

    let response = dispatcher.dispatch("dyn.only", json!(null)).await.unwrap();
    assert_eq!(response.as_json(), None);
    assert_eq!(response.as_html(), None);
    assert_eq!(response.status, 200);
}

// Dynamic rules choose by intent content
#[tokio::test]
async fn test_dynamic_rule_by_input() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "a.html", "A");
    write_view(&vista, "b.html", "B");
    dispatcher.add_action(Action::new("pick").render(TemplateSource::dynamic(|intent| {
        intent.input()["view"].as_str().map(|v| format!("{}.html", v))
    })));

    let a = dispatcher.dispatch("pick", json!({"view": "a"})).await.unwrap();
    let b = dispatcher.dispatch("pick", json!({"view": "b"})).await.unwrap();
    let none = dispatcher.dispatch("pick", json!({})).await.unwrap();
    assert_eq!(a.as_html(), Some("A"));
    assert_eq!(b.as_html(), Some("B"));
    assert_eq!(none.as_html(), None);
}

// A missing view turns into RENDER.ERROR and reaches the after observer
#[tokio::test]
async fn test_render_failure_replaces_error() {
    let (_dir, _vista, mut dispatcher) = setup(RenderOptions::new());
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let outcomes_clone = outcomes.clone();

    dispatcher.add_action(
        Action::new("broken")
            .handle(failing(404))
            .render_when("missing.html", 404)
            .after_render(move |_, ev: &AfterRender| {
                outcomes_clone
                    .lock()
                    .unwrap()
                    .push((ev.template.clone(), ev.outcome.clone().map_err(|e| e.code)));
            }),
    );

    let response = dispatcher.dispatch("broken", json!(null)).await.unwrap();
    assert_eq!(response.status, 500);
    assert_eq!(response.as_json().unwrap()["error"]["code"], "RENDER.ERROR");
    assert_eq!(
        *outcomes.lock().unwrap(),
        vec![("missing.html".to_string(), Err("RENDER.ERROR".to_string()))]
    );
}

// Before and after observers see the template, in order
#[tokio::test]
async fn test_render_observers_order() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "home.html", "<p>home</p>");
    let log = Arc::new(Mutex::new(Vec::new()));
    let (before_log, after_log) = (log.clone(), log.clone());

    dispatcher.add_action(
        Action::new("home")
            .before_render(move |_, ev: &BeforeRender| {
                before_log.lock().unwrap().push(format!("before {}", ev.template));
            })
            .render("home.html")
            .after_render(move |intent, ev: &AfterRender| {
                assert_eq!(intent.raw_result(), Some("<p>home</p>"));
                let html = ev.outcome.as_ref().unwrap();
                after_log.lock().unwrap().push(format!("after {} {}", ev.template, html));
            }),
    );

    dispatcher.dispatch("home", json!(null)).await.unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["before home.html", "after home.html <p>home</p>"]
    );
}

// Template engine missing: static views still work, others are NOT_READY
#[tokio::test]
async fn test_html_engine_only_serves_static_views() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new().engine("html"));
    write_view(&vista, "static.htm", "static");
    write_view(&vista, "dynamic.jinja", "{{ x }}");
    dispatcher.add_action(Action::new("s").render("static.htm"));
    dispatcher.add_action(Action::new("d").render("dynamic.jinja"));

    let s = dispatcher.dispatch("s", json!(null)).await.unwrap();
    assert_eq!(s.as_html(), Some("static"));

    let d = dispatcher.dispatch("d", json!(null)).await.unwrap();
    assert_eq!(d.status, 500);
    assert_eq!(d.as_json().unwrap()["error"]["code"], "RENDER.NOT_READY");
}

// add_local is visible to every action's render
#[tokio::test]
async fn test_add_local_visible_across_actions() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(&vista, "one.jinja", "1:{{ brand }}");
    write_view(&vista, "two.jinja", "2:{{ brand }}");
    dispatcher.add_action(Action::new("one").render("one.jinja"));
    dispatcher.add_action(Action::new("two").render("two.jinja"));

    vista.renderer().add_local("brand", "Acme");

    let one = dispatcher.dispatch("one", json!(null)).await.unwrap();
    let two = dispatcher.dispatch("two", json!(null)).await.unwrap();
    assert_eq!(one.as_html(), Some("1:Acme"));
    assert_eq!(two.as_html(), Some("2:Acme"));
}

// Callback engines receive the resolved path and merged locals
#[tokio::test]
async fn test_callback_engine_end_to_end() {
    let options = RenderOptions::new().with_callback_engine(|path, locals| {
        let file = path.file_name().and_then(|f| f.to_str()).unwrap_or("");
        Ok(format!("{}|{}|{}", file, locals["app"]["name"], locals["intent"]["action"]))
    });
    let (_dir, _vista, mut dispatcher) = setup(options);
    dispatcher.add_action(Action::new("cb").render("view.tpl"));

    let response = dispatcher.dispatch("cb", json!(null)).await.unwrap();
    assert_eq!(response.as_html(), Some("view.tpl|\"demo\"|\"cb\""));
}

// is_action marks the current action in shared layouts
#[tokio::test]
async fn test_is_action_helper_in_layout() {
    let (_dir, vista, mut dispatcher) = setup(RenderOptions::new());
    write_view(
        &vista,
        "nav.jinja",
        "<a class=\"{{ is_action('home', 'on') }}\">home</a><a class=\"{{ is_action('about', 'on') }}\">about</a>",
    );
    dispatcher.add_action(Action::new("home").render("nav.jinja"));
    dispatcher.add_action(Action::new("about").render("nav.jinja"));

    let home = dispatcher.dispatch("home", json!(null)).await.unwrap();
    insta::assert_snapshot!(home.as_html().unwrap(), @r#"<a class="on">home</a><a class="">about</a>"#);

    let about = dispatcher.dispatch("about", json!(null)).await.unwrap();
    insta::assert_snapshot!(about.as_html().unwrap(), @r#"<a class="">home</a><a class="on">about</a>"#);
}

// Actions without render rules are untouched by the hook
#[tokio::test]
async fn test_plain_actions_keep_json() {
    let (_dir, _vista, mut dispatcher) = setup(RenderOptions::new());
    dispatcher.add_action(Action::new("api").handle(|intent| {
        intent.set_result(json!({"v": 1}));
        Ok(())
    }));

    let response = dispatcher.dispatch("api", json!(null)).await.unwrap();
    assert_eq!(response.as_json(), Some(&json!({"result": {"v": 1}})));
}

// Absolute template paths bypass the view root
#[tokio::test]
async fn test_absolute_template_path() {
    let (_dir, _vista, mut dispatcher) = setup(RenderOptions::new());
    let elsewhere = tempfile::tempdir().unwrap();
    let page = elsewhere.path().join("outside.html");
    fs::write(&page, "outside").unwrap();
    dispatcher.add_action(Action::new("abs").render(page_name(&page)));

    let response = dispatcher.dispatch("abs", json!(null)).await.unwrap();
    assert_eq!(response.as_html(), Some("outside"));
}

fn page_name(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
