//! Tests for the translation step of content loading.

use std::sync::Arc;
use std::time::Duration;

use plinth_plugins::prelude::*;
use plinth_test::{LocalizeCall, RecordingLocalizer, ScriptedPlugin, TestSite, test_site_config};
use serde_json::{Map, Value, json};

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Content listing each translation file as `path: {id: message}`, in the
/// order the files were received.
fn describe(files: &[TranslationFile]) -> Value {
    Value::Array(
        files
            .iter()
            .map(|file| {
                let messages: Map<String, Value> = file
                    .content
                    .iter()
                    .map(|(id, m)| (id.clone(), Value::String(m.message.clone())))
                    .collect();
                let mut entry = Map::new();
                entry.insert(file.path.clone(), Value::Object(messages));
                Value::Object(entry)
            })
            .collect(),
    )
}

#[tokio::test]
async fn test_each_translation_file_localized_once_and_passed_in_order() -> anyhow::Result<()> {
    let site = TestSite::new();
    let context = site.context();
    let localizer = Arc::new(
        RecordingLocalizer::new()
            .with_message("docs", "sidebar", "intro", "Présentation")
            .with_message("docs", "current", "version", "Actuelle"),
    );
    let docs = Arc::new(
        ScriptedPlugin::new("docs")
            .with_content(json!({"docs": ["intro"]}))
            .with_translation_files(vec![
                TranslationFile::new("sidebar")
                    .with_message("intro", "Introduction")
                    .with_message("guides", "Guides"),
                TranslationFile::new("current").with_message("version", "Next"),
            ])
            .with_translate_content(|_, files| Ok(describe(files))),
    );

    let result = site
        .pipeline_with_localizer(vec![docs.clone()], localizer.clone())
        .load_plugins(&context)
        .await?;

    let mut calls = localizer.calls();
    calls.sort_by(|a, b| a.path.cmp(&b.path));
    let expected = |path: &str| LocalizeCall {
        plugin: PluginIdentifier::with_default_id("docs"),
        path: path.to_owned(),
        localization_dir: context.localization_dir.clone(),
    };
    assert_eq!(calls, [expected("current"), expected("sidebar")]);

    assert_eq!(
        result.plugins[0].content.as_ref(),
        &json!([
            {"sidebar": {"guides": "Guides", "intro": "Présentation"}},
            {"current": {"version": "Actuelle"}},
        ])
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_translation_files_keep_order_when_localized_out_of_order() -> anyhow::Result<()> {
    let site = TestSite::new();
    let localizer = Arc::new(
        RecordingLocalizer::new()
            .with_delay("sidebar", Duration::from_millis(200))
            .with_message("docs", "sidebar", "intro", "Présentation")
            .with_message("docs", "current", "version", "Actuelle"),
    );
    let docs = ScriptedPlugin::new("docs")
        .with_translation_files(vec![
            TranslationFile::new("sidebar").with_message("intro", "Introduction"),
            TranslationFile::new("current").with_message("version", "Next"),
        ])
        .with_translate_content(|_, files| Ok(describe(files)));

    let result = site
        .pipeline_with_localizer(vec![Arc::new(docs)], localizer.clone())
        .load_plugins(&site.context())
        .await?;

    assert_eq!(localizer.completed(), ["current", "sidebar"]);
    assert_eq!(
        result.plugins[0].content.as_ref(),
        &json!([
            {"sidebar": {"intro": "Présentation"}},
            {"current": {"version": "Actuelle"}},
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_untranslated_plugin_content_passes_through() -> anyhow::Result<()> {
    let site = TestSite::new();
    let localizer = Arc::new(RecordingLocalizer::new());
    let blog = Arc::new(ScriptedPlugin::new("blog").with_content(json!({"posts": 4})));

    let result = site
        .pipeline_with_localizer(vec![blog], localizer.clone())
        .load_plugins(&site.context())
        .await?;

    assert_eq!(result.plugins[0].content.as_ref(), &json!({"posts": 4}));
    assert_eq!(localizer.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_disjoint_theme_config_slices_are_all_kept() -> anyhow::Result<()> {
    let mut config = test_site_config();
    config.theme_config = object(json!({
        "navbar": {"title": "Docs"},
        "footer": {"copyright": "Plinth"},
        "colorMode": "dark",
    }));
    let site = TestSite::with_config(config);
    let context = site.context();

    let navbar = ScriptedPlugin::new("navbar")
        .with_translation_files(vec![
            TranslationFile::new("navbar").with_message("title", "Documentation"),
        ])
        .with_translate_theme_config(|theme_config, files| {
            assert!(theme_config.contains_key("navbar"));
            let title = files[0].message("title").unwrap_or_default();
            Ok(Some(object(json!({"navbar": {"title": title}}))))
        });
    let footer = ScriptedPlugin::new("footer").with_translate_theme_config(|_, files| {
        assert!(files.is_empty());
        Ok(Some(object(json!({"footer": {"copyright": "© Plinth"}}))))
    });
    let untouched = ScriptedPlugin::new("search").with_translate_theme_config(|_, _| Ok(None));
    let plugins: Vec<Arc<dyn Plugin>> =
        vec![Arc::new(navbar), Arc::new(footer), Arc::new(untouched)];

    site.pipeline(plugins).load_plugins(&context).await?;

    assert_eq!(
        Value::Object(context.site.theme_config.snapshot()),
        json!({
            "navbar": {"title": "Documentation"},
            "footer": {"copyright": "© Plinth"},
            "colorMode": "dark",
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_json_file_localizer_reads_site_translations() -> anyhow::Result<()> {
    let site = TestSite::new();
    site.write_translation(
        "docs",
        "sidebar",
        &json!({"intro": {"message": "Présentation", "description": "Sidebar label"}}),
    );
    site.write_translation(
        "docs-community",
        "sidebar",
        &json!({"intro": {"message": "Accueil"}}),
    );

    let instance = |id: &'static str| -> Arc<dyn Plugin> {
        Arc::new(
            ScriptedPlugin::new("docs")
                .with_id(id)
                .with_translation_files(vec![
                    TranslationFile::new("sidebar")
                        .with_message("intro", "Introduction")
                        .with_message("guides", "Guides"),
                ])
                .with_translate_content(|_, files| Ok(describe(files))),
        )
    };

    let result = site
        .pipeline(vec![instance("default"), instance("community")])
        .load_plugins(&site.context())
        .await?;

    assert_eq!(
        result.plugins[0].content.as_ref(),
        &json!([{"sidebar": {"guides": "Guides", "intro": "Présentation"}}])
    );
    assert_eq!(
        result.plugins[1].content.as_ref(),
        &json!([{"sidebar": {"guides": "Guides", "intro": "Accueil"}}])
    );
    Ok(())
}

#[tokio::test]
async fn test_localizer_failure_names_plugin_and_file() {
    let site = TestSite::new();
    let localizer = Arc::new(RecordingLocalizer::new().failing_on("footer"));
    let theme = ScriptedPlugin::new("theme")
        .with_id("classic")
        .with_translation_files(vec![
            TranslationFile::new("navbar"),
            TranslationFile::new("footer"),
        ])
        .with_translate_content(|content, _| Ok(content));

    let err = site
        .pipeline_with_localizer(vec![Arc::new(theme)], localizer)
        .load_plugins(&site.context())
        .await
        .unwrap_err();

    match err {
        PluginError::Localization {
            identifier, path, ..
        } => {
            assert_eq!(identifier, PluginIdentifier::new("theme", "classic"));
            assert_eq!(path, "footer");
        },
        other => panic!("expected a localization error, got {other}"),
    }
}

#[tokio::test]
async fn test_translated_content_reaches_content_loaded() -> anyhow::Result<()> {
    let site = TestSite::new();
    let localizer =
        Arc::new(RecordingLocalizer::new().with_message("blog", "options", "title", "Journal"));
    let blog = ScriptedPlugin::new("blog")
        .with_content(json!({"title": "Blog"}))
        .with_translation_files(vec![
            TranslationFile::new("options").with_message("title", "Blog"),
        ])
        .with_translate_content(|mut content, files| {
            if let Some(title) = files[0].message("title") {
                content["title"] = json!(title);
            }
            Ok(content)
        })
        .with_content_loaded(|content, actions| {
            actions.set_global_data(json!({"heading": content["title"]}));
            Ok(())
        });

    let result = site
        .pipeline_with_localizer(vec![Arc::new(blog)], localizer)
        .load_plugins(&site.context())
        .await?;

    assert_eq!(
        result.global_data.get("blog", "default"),
        Some(&json!({"heading": "Journal"}))
    );
    Ok(())
}
