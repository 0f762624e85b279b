//! Property-based tests for overlay application.

use std::rc::Rc;

use confdoc::parser::Parser;
use confdoc::{Body, BodyContent, Schema};
use overlay::{Overlay, apply_overlays, parse_cli_argument};
use proptest::prelude::*;

fn body(source: &str) -> Rc<dyn Body> {
    Rc::new(
        Parser::new(source.to_string(), 0)
            .parse()
            .expect("config has problems"),
    )
}

fn overlay(raw: &str) -> Rc<dyn Overlay> {
    let (o, diags) = parse_cli_argument(raw);
    assert!(diags.is_empty(), "{}", diags);
    Rc::new(o.expect("overlay"))
}

fn setting(name: &str, value: &str) -> Rc<dyn Overlay> {
    overlay(&format!("{}={}", name, value))
}

fn value_of(content: &BodyContent, name: &str) -> Option<String> {
    content
        .attributes
        .get(name)
        .map(|a| a.expr.value.to_string())
}

/// Attribute values and block labels, which is everything an overlay can change.
fn snapshot(content: &BodyContent) -> (Vec<(String, String, bool)>, Vec<Vec<String>>) {
    let attrs = content
        .attributes
        .values()
        .map(|a| (a.name.clone(), a.expr.value.to_string(), a.range.is_some()))
        .collect();
    let blocks = content.blocks.iter().map(|b| b.labels.clone()).collect();
    (attrs, blocks)
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,8}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,16}"
}

proptest! {
    /// Property: an overlay replaces an attribute the document defines
    #[test]
    fn overlay_replaces_existing_attribute(name in name_strategy(), value in value_strategy()) {
        let base = body(&format!("{} = \"original\"\n", name));
        let wrapped = apply_overlays(base, vec![setting(&name, &value)]);
        let (content, diags) = wrapped.content(&Schema::new().required_attribute(name.clone()));

        prop_assert!(diags.is_empty(), "{}", diags);
        prop_assert_eq!(value_of(&content, &name), Some(value));
        prop_assert!(content.attributes[&name].range.is_none());
    }

    /// Property: an overlay inserts an attribute the document leaves out
    #[test]
    fn overlay_inserts_missing_attribute(name in name_strategy(), value in value_strategy()) {
        let wrapped = apply_overlays(body(""), vec![setting(&name, &value)]);
        let (content, diags) = wrapped.content(&Schema::new().required_attribute(name.clone()));

        prop_assert!(diags.is_empty(), "{}", diags);
        prop_assert_eq!(value_of(&content, &name), Some(value));
    }

    /// Property: an undeclared name is an error in full mode and a leftover in partial mode
    #[test]
    fn undeclared_attribute(name in name_strategy(), value in value_strategy()) {
        let schema = Schema::new().attribute("Declared");
        let o = setting(&name, &value);

        let mut content = BodyContent::new();
        let diags = o.apply_overlay(&mut content, &schema);
        prop_assert_eq!(diags.len(), 1);
        let text = diags.to_string();
        let expected = format!("Unexpected argument \"{}\".", name);
        prop_assert!(text.contains(&expected));
        prop_assert!(!text.contains("Missing required argument"));

        let mut content = BodyContent::new();
        let (leftover, diags) = o.partial_apply_overlay(&mut content, &schema);
        prop_assert!(diags.is_empty());
        prop_assert!(leftover.is_some());
        prop_assert!(content.attributes.is_empty());
    }

    /// Property: the last overlay for an attribute wins
    #[test]
    fn later_overlays_win(name in name_strategy(), first in value_strategy(), second in value_strategy()) {
        let schema = Schema::new().attribute(name.clone());

        let forward = apply_overlays(body(""), vec![setting(&name, &first), setting(&name, &second)]);
        let (content, _) = forward.content(&schema);
        prop_assert_eq!(value_of(&content, &name), Some(second.clone()));

        let backward = apply_overlays(body(""), vec![setting(&name, &second), setting(&name, &first)]);
        let (content, _) = backward.content(&schema);
        prop_assert_eq!(value_of(&content, &name), Some(first));
    }

    /// Property: applying the same overlay twice is the same as applying it once
    #[test]
    fn applying_twice_is_applying_once(
        label in name_strategy(),
        value in value_strategy(),
        as_block in any::<bool>(),
    ) {
        let raw = if as_block {
            format!("block.{}.foo={}", label, value)
        } else {
            format!("top={}", value)
        };
        let source = "top = \"t\"\nblock \"a\" { foo = \"a\" }\n";
        let schema = Schema::new().attribute("top").block("block", &["name"]);

        let once = apply_overlays(body(source), vec![overlay(&raw)]);
        let twice = apply_overlays(body(source), vec![overlay(&raw), overlay(&raw)]);
        let (once, d1) = once.content(&schema);
        let (twice, d2) = twice.content(&schema);

        prop_assert!(d1.is_empty() && d2.is_empty());
        prop_assert_eq!(snapshot(&once), snapshot(&twice));
    }

    /// Property: an overlay on one label tuple leaves blocks with other labels alone
    #[test]
    fn only_the_matching_block_changes(
        target in name_strategy(),
        other in name_strategy(),
        value in value_strategy(),
    ) {
        prop_assume!(target != other);
        let source = format!(
            "block \"{}\" {{ foo = \"t\" }}\nblock \"{}\" {{ foo = \"o\" }}\n",
            target, other
        );
        let wrapped = apply_overlays(body(&source), vec![setting(&format!("block.{}.foo", target), &value)]);
        let (content, diags) = wrapped.content(&Schema::new().block("block", &["name"]));
        prop_assert!(diags.is_empty(), "{}", diags);
        prop_assert_eq!(content.blocks.len(), 2);

        let foo = Schema::new().required_attribute("foo");
        let (first, _) = content.blocks[0].body.content(&foo);
        let (second, _) = content.blocks[1].body.content(&foo);
        prop_assert_eq!(value_of(&first, "foo"), Some(value));
        prop_assert_eq!(value_of(&second, "foo"), Some("o".to_string()));
    }

    /// Property: unmatched labels append a new block after the existing ones
    #[test]
    fn unmatched_labels_append(existing in name_strategy(), fresh in name_strategy()) {
        prop_assume!(existing != fresh);
        let source = format!("block \"{}\" {{ foo = \"e\" }}\n", existing);
        let wrapped = apply_overlays(body(&source), vec![setting(&format!("block.{}.foo", fresh), "n")]);
        let (content, _) = wrapped.content(&Schema::new().block("block", &["name"]));

        let labels: Vec<Vec<String>> = content.blocks.iter().map(|b| b.labels.clone()).collect();
        prop_assert_eq!(labels, vec![vec![existing], vec![fresh]]);
    }
}
