use std::str::FromStr;

use anyhow::{Context, anyhow, bail};

/// Action applied to the legend from the command line.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    /// `toggle:<id>`
    Toggle(String),
    /// `show:<id>`
    Show(String),
    /// `hide:<id>`
    Hide(String),
    /// `expand:<id>`
    Expand(String),
    /// `opacity:<id>:<value>`
    Opacity(String, f32),
    /// `symbology:<id>:<symbology-id>:<on|off>`
    Symbology(String, String, bool),
    /// `load:<layer-id>`
    Load(String),
    /// `fail:<layer-id>`
    Fail(String),
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let mut parts = input.split(':');
        let verb = parts.next().unwrap_or_default();
        let target = parts
            .next()
            .filter(|target| !target.is_empty())
            .ok_or_else(|| anyhow!("command `{input}` has no target"))?
            .to_owned();

        let command = match verb {
            "toggle" => Command::Toggle(target),
            "show" => Command::Show(target),
            "hide" => Command::Hide(target),
            "expand" => Command::Expand(target),
            "load" => Command::Load(target),
            "fail" => Command::Fail(target),
            "opacity" => {
                let value = parts
                    .next()
                    .ok_or_else(|| anyhow!("command `{input}` has no value"))?;
                let value = value
                    .parse::<f32>()
                    .with_context(|| format!("invalid opacity `{value}`"))?;
                Command::Opacity(target, value)
            },
            "symbology" => {
                let item = parts.next().ok_or_else(|| {
                    anyhow!("command `{input}` has no symbology id")
                })?;
                let visible = match parts.next() {
                    Some("on") => true,
                    Some("off") => false,
                    _ => bail!("command `{input}` must end with :on or :off"),
                };
                Command::Symbology(target, item.to_owned(), visible)
            },
            _ => bail!("unknown command `{verb}`"),
        };

        if parts.next().is_some() {
            bail!("command `{input}` has trailing arguments");
        }
        Ok(command)
    }
}
