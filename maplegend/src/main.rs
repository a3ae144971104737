mod command;

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use env_logger::Env;
use maplegend_core::{
    LayerResource, LayerSpec, LegendTree, MemoryLayer, NodeConfig, NodeId,
    NodeKind, as_handles, load_catalogue,
};

use crate::command::Command;

const USAGE: &str = "usage: maplegend <legend.json> <layers.json> [command...]

commands:
  toggle:<id>  show:<id>  hide:<id>  expand:<id>
  opacity:<id>:<value>  symbology:<id>:<symbology-id>:<on|off>
  load:<layer-id>  fail:<layer-id>";

type SharedLayers = HashMap<String, Rc<RefCell<MemoryLayer>>>;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [legend_path, layers_path, commands @ ..] = args.as_slice() else {
        bail!("{USAGE}");
    };

    let config = read_config(Path::new(legend_path))?;
    let layers = read_layers(Path::new(layers_path))?;
    let by_id: SharedLayers = layers
        .iter()
        .map(|layer| (layer.borrow().id().to_owned(), Rc::clone(layer)))
        .collect();

    let mut tree = LegendTree::build(&config, &as_handles(&layers))
        .context("failed to build legend")?;
    tree.initialize();
    tree.poll_bindings();

    for raw in commands {
        let command: Command = raw.parse()?;
        apply(&mut tree, &by_id, command)?;
        tree.poll_bindings();
    }

    for diagnostic in tree.drain_diagnostics() {
        log::info!("diagnostic for `{}`: {diagnostic}", diagnostic.subject());
    }

    print!("{}", render(&tree));
    Ok(())
}

fn read_config(path: &Path) -> Result<NodeConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    NodeConfig::from_json(&text)
        .with_context(|| format!("failed to parse {}", path.display()))
}

fn read_layers(path: &Path) -> Result<Vec<Rc<RefCell<MemoryLayer>>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let specs: Vec<LayerSpec> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(load_catalogue(specs))
}

fn apply(
    tree: &mut LegendTree,
    layers: &SharedLayers,
    command: Command,
) -> Result<()> {
    match command {
        Command::Toggle(id) => {
            let node = node(tree, &id)?;
            tree.toggle_visibility(node, None)?;
        },
        Command::Show(id) => {
            let node = node(tree, &id)?;
            tree.toggle_visibility(node, Some(true))?;
        },
        Command::Hide(id) => {
            let node = node(tree, &id)?;
            tree.toggle_visibility(node, Some(false))?;
        },
        Command::Expand(id) => {
            let node = node(tree, &id)?;
            tree.toggle_expanded(node, None)?;
        },
        Command::Opacity(id, value) => {
            let node = node(tree, &id)?;
            tree.set_opacity(node, value)?;
        },
        Command::Symbology(id, item, visible) => {
            let node = node(tree, &id)?;
            tree.set_child_symbology_visibility(node, &item, visible)?;
        },
        Command::Load(id) => layer(layers, &id)?.borrow_mut().finish_loading(),
        Command::Fail(id) => layer(layers, &id)?
            .borrow_mut()
            .fail_loading(format!("load of `{id}` rejected")),
    }
    Ok(())
}

fn node(tree: &LegendTree, id: &str) -> Result<NodeId> {
    tree.find(id)
        .with_context(|| format!("no legend node with id `{id}`"))
}

fn layer<'a>(
    layers: &'a SharedLayers,
    id: &str,
) -> Result<&'a Rc<RefCell<MemoryLayer>>> {
    layers
        .get(id)
        .with_context(|| format!("no layer with id `{id}`"))
}

fn render(tree: &LegendTree) -> String {
    let mut out = String::new();
    for row in tree.rows() {
        let Some(node) = tree.node(row.node) else {
            continue;
        };
        let mark = match node.visibility() {
            Some(true) => "[x]",
            Some(false) => "[ ]",
            None => "[-]",
        };
        let kind = match node.kind() {
            NodeKind::Entry => "entry",
            NodeKind::Group => "group",
            NodeKind::Set => "set",
            NodeKind::Info => "info",
            NodeKind::Placeholder => "placeholder",
        };
        let label = if node.name().is_empty() {
            node.id()
        } else {
            node.name()
        };
        out.push_str(&format!(
            "{indent}{mark} {label} ({kind}, v{version})\n",
            indent = "  ".repeat(row.depth),
            version = node.change_marker().value(),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use maplegend_core::{LegendTree, MemoryLayer, as_handles};

    use super::render;

    #[test]
    fn given_small_legend_when_rendered_then_rows_show_state_and_depth() {
        let layers = vec![
            MemoryLayer::new("roads").with_name("Roads").into_shared(),
            MemoryLayer::new("rivers").with_visibility(false).into_shared(),
        ];
        let mut tree = LegendTree::from_json(
            r#"{
                "layerId": "root",
                "children": [{ "layerId": "base", "name": "Base", "children": [
                    { "layerId": "roads", "name": "Roads" },
                    { "layerId": "rivers" },
                    { "layerId": "note", "type": "InfoSection" }
                ]}]
            }"#,
            &as_handles(&layers),
        )
        .expect("legend builds");
        tree.initialize();

        let rendered = render(&tree);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("[x] Base (group"));
        assert!(lines[1].starts_with("  [x] Roads (entry"));
        assert!(lines[2].starts_with("  [ ] rivers (entry"));
        assert!(lines[3].starts_with("  [-] note (info"));
    }
}
