//! Resolving token vectors to nodes and running them.

use bevy::log::debug;

use super::{
    AmbiguousCommandError, CallbackData, CallbackKind, CommandError, CommandId, CommandTree,
    ExecuteContext, ExecuteState,
};

impl CommandTree {
    /// Dispatch `tokens` starting at `id`.
    ///
    /// Each leading token that names a child (exactly, or as an unambiguous
    /// prefix) moves dispatch one level down; the first token that matches
    /// nothing, and everything after it, becomes input for the node reached.
    ///
    /// Returns `Ok(None)` when a preprocessor vetoed the run.
    pub fn run<S: AsRef<str>>(
        &mut self,
        id: CommandId,
        tokens: &[S],
    ) -> Result<Option<ExecuteContext>, CommandError> {
        if !self.contains(id) {
            return Err(CommandError::UnknownCommand(id));
        }

        let tokens: Vec<&str> = tokens.iter().map(AsRef::as_ref).collect();
        let mut current = id;
        let mut rest = tokens.as_slice();

        while let Some((first, tail)) = rest.split_first() {
            match self.resolve_child(current, first)? {
                Some(child) => {
                    debug!("Forwarding '{}' to {}", first, child);
                    current = child;
                    rest = tail;
                }
                None => break,
            }
        }

        self.execute(current, rest)
    }

    /// The child a single token dispatches to, if any.
    pub fn resolve_child(
        &self,
        id: CommandId,
        token: &str,
    ) -> Result<Option<CommandId>, AmbiguousCommandError> {
        let lookup = token.to_lowercase();
        if let Some(exact) = self.child(id, &lookup) {
            return Ok(Some(exact));
        }

        match self.possible_children(id, &lookup).as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(*only)),
            many => Err(AmbiguousCommandError {
                lookup,
                candidates: many
                    .iter()
                    .filter_map(|&child| self.name(child).map(str::to_owned))
                    .collect(),
            }),
        }
    }

    /// Run a node with `tokens` as its own input, skipping child dispatch.
    pub fn execute(
        &mut self,
        id: CommandId,
        tokens: &[&str],
    ) -> Result<Option<ExecuteContext>, CommandError> {
        let name = self
            .absolute_name(id)
            .ok_or(CommandError::UnknownCommand(id))?;
        let node = self.node(id).ok_or(CommandError::UnknownCommand(id))?;

        if let Some(preprocessor) = &node.preprocessor {
            if !preprocessor(tokens) {
                debug!("Preprocessor vetoed '{}'", name);
                return Ok(None);
            }
        }

        let options = node
            .schema
            .parse(tokens)
            .map_err(|source| CommandError::Options {
                command: name.clone(),
                source,
            })?;
        let mut ctx = ExecuteContext::new(id, name, options);

        if ctx.options().help_requested() {
            if let Some(help) = &node.help {
                help(&mut ctx);
            }
            let text = node.option_help_text();
            ctx.write("");
            ctx.write(text);
        } else if ctx.len() < node.required_args {
            let line = format!(
                "'{}' requires {} argument(s), got {}",
                ctx.name(),
                node.required_args,
                ctx.len()
            );
            ctx.write(line);
            ctx.mark_failed();
        } else {
            let has_work = node.has_work();
            self.apply_setting(id, &mut ctx);
            self.run_processors(id, &mut ctx)?;
            if has_work && ctx.state() == ExecuteState::Pending {
                ctx.mark_success();
            }
        }

        self.notify(&ctx);
        Ok(Some(ctx))
    }

    /// Assign and echo the node's setting, if it has one.
    fn apply_setting(&mut self, id: CommandId, ctx: &mut ExecuteContext) {
        let Some(setting) = self
            .node_mut(id)
            .and_then(|node| node.setting.as_deref_mut())
        else {
            return;
        };

        if !ctx.is_empty() {
            let value = ctx.join(" ");
            if !setting.set_string(&value) {
                let line = format!("Invalid value '{}' for {}", value, ctx.name());
                ctx.write(line);
                ctx.mark_failed();
            }
        }

        let line = format!("{} = {}", ctx.name(), setting.get_string());
        ctx.write(line);
    }

    fn run_processors(&self, id: CommandId, ctx: &mut ExecuteContext) -> Result<(), CommandError> {
        let Some(node) = self.node(id) else {
            return Ok(());
        };

        for processor in &node.processors {
            if ctx.state().is_terminal() {
                break;
            }
            if let Err(source) = processor(ctx) {
                ctx.mark_failed();
                self.notify(ctx);
                return Err(CommandError::Processor {
                    command: ctx.name().to_owned(),
                    source,
                });
            }
        }
        Ok(())
    }

    /// Fire the callbacks matching the context's final state.
    fn notify(&self, ctx: &ExecuteContext) {
        let kind = match ctx.state() {
            ExecuteState::Success => CallbackKind::Success,
            ExecuteState::Failed => CallbackKind::Failure,
            ExecuteState::Pending | ExecuteState::Stopped => return,
        };
        let Some(node) = self.node(ctx.command()) else {
            return;
        };
        node.callbacks.invoke(&CallbackData {
            command: ctx.command(),
            name: ctx.name().into(),
            kind,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use clap::{Arg, ArgAction};

    use crate::core::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recorder(log: &Log, tag: &'static str) -> Callback {
        let log = log.clone();
        Arc::new(move |data: &CallbackData| {
            log.lock().unwrap().push(format!("{tag}:{}", data.name));
        })
    }

    fn marking(name: &str, parent: CommandId) -> CommandBuilder {
        CommandBuilder::new(name).parent(parent).processor(|ctx| {
            let line = format!("ran {}", ctx.name());
            ctx.write(line);
            ctx.mark_success();
            Ok(())
        })
    }

    fn prefix_tree() -> (CommandTree, CommandId, CommandId) {
        let mut tree = CommandTree::default();
        let foo = tree.build(marking("foo", CommandTree::GLOBAL)).unwrap();
        let foobar = tree.build(marking("foobar", CommandTree::GLOBAL)).unwrap();
        (tree, foo, foobar)
    }

    #[test]
    fn test_exact_match_beats_prefix() {
        let (mut tree, foo, _) = prefix_tree();
        let ctx = tree.run(CommandTree::GLOBAL, &["FOO"]).unwrap().unwrap();
        assert_eq!(ctx.command(), foo);
        assert_eq!(ctx.output(), ["ran foo"]);
    }

    #[test]
    fn test_unique_prefix_forwards() {
        let (mut tree, _, foobar) = prefix_tree();
        let ctx = tree.run(CommandTree::GLOBAL, &["foob", "x"]).unwrap().unwrap();
        assert_eq!(ctx.command(), foobar);
        assert_eq!(ctx.args(), ["x"]);
    }

    #[test]
    fn test_ambiguous_prefix_fails() {
        let (mut tree, _, _) = prefix_tree();
        let err = tree.run(CommandTree::GLOBAL, &["Fo"]).unwrap_err();
        match err {
            CommandError::Ambiguous(err) => {
                assert_eq!(err.lookup, "fo");
                assert_eq!(err.candidates, ["foo", "foobar"]);
                assert_eq!(err.to_string(), "Ambiguous command \"fo\": foo, foobar");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ambiguity_surfaces_from_depth() {
        let mut tree = CommandTree::default();
        let outer = tree.build(CommandBuilder::new("outer").parent(CommandTree::GLOBAL)).unwrap();
        tree.build(marking("speed", outer)).unwrap();
        tree.build(marking("spin", outer)).unwrap();

        let err = tree.run(CommandTree::GLOBAL, &["out", "sp"]).unwrap_err();
        assert!(matches!(err, CommandError::Ambiguous(_)));
    }

    #[test]
    fn test_zero_match_falls_through() {
        let mut tree = CommandTree::default();
        let say = tree.build(marking("say", CommandTree::GLOBAL)).unwrap();
        tree.build(marking("loud", say)).unwrap();

        let ctx = tree.run(say, &["quiet", "please"]).unwrap().unwrap();
        assert_eq!(ctx.command(), say);
        assert_eq!(ctx.args(), ["quiet", "please"]);
        assert_eq!(ctx.state(), ExecuteState::Success);
    }

    #[test]
    fn test_unmatched_input_at_global_runs_locally() {
        let mut tree = CommandTree::default();
        tree.build(marking("say", CommandTree::GLOBAL)).unwrap();

        let ctx = tree.run(CommandTree::GLOBAL, &["unknown", "x"]).unwrap().unwrap();
        assert_eq!(ctx.command(), CommandTree::GLOBAL);
        assert_eq!(ctx.args(), ["unknown", "x"]);
        assert_eq!(ctx.state(), ExecuteState::Pending);
    }

    #[test]
    fn test_unknown_handle() {
        let mut tree = CommandTree::default();
        let ghost = CommandId::from_index(42);
        assert!(matches!(
            tree.run(ghost, &["x"]),
            Err(CommandError::UnknownCommand(id)) if id == ghost
        ));
    }

    #[test]
    fn test_help_short_circuits() {
        let mut tree = CommandTree::default();
        let ran = Arc::new(Mutex::new(false));
        let flag = ran.clone();
        let id = tree
            .build(
                CommandBuilder::new("esp")
                    .parent(CommandTree::GLOBAL)
                    .option(Arg::new("range").long("range"))
                    .help(|ctx| ctx.write("Draws boxes around players"))
                    .processor(move |ctx| {
                        *flag.lock().unwrap() = true;
                        ctx.mark_success();
                        Ok(())
                    }),
            )
            .unwrap();

        let ctx = tree.run(CommandTree::GLOBAL, &["esp", "-?"]).unwrap().unwrap();
        assert!(!*ran.lock().unwrap());
        assert_eq!(ctx.state(), ExecuteState::Pending);
        assert_eq!(ctx.output()[0], "Draws boxes around players");
        assert_eq!(ctx.output()[1], "");
        assert!(ctx.output()[2].contains("--range"));
        assert_eq!(ctx.command(), id);
    }

    #[test]
    fn test_help_without_auto_gen_is_an_argument() {
        let mut tree = CommandTree::default();
        let id = tree
            .build(marking("raw", CommandTree::GLOBAL).help_auto_gen(false))
            .unwrap();
        let ctx = tree.run(id, &["--help"]).unwrap().unwrap();
        assert_eq!(ctx.state(), ExecuteState::Success);
        assert_eq!(ctx.options().unrecognized(), ["--help"]);
    }

    #[test]
    fn test_success_callbacks_in_order() {
        let log: Log = Arc::default();
        let mut tree = CommandTree::default();
        let id = tree
            .build(
                marking("cmd", CommandTree::GLOBAL)
                    .callback(CallbackKind::Success, recorder(&log, "first"))
                    .callback(CallbackKind::Failure, recorder(&log, "failure"))
                    .callback(CallbackKind::Success, recorder(&log, "second")),
            )
            .unwrap();

        tree.run(id, &[] as &[&str]).unwrap();
        assert_eq!(*log.lock().unwrap(), ["first:cmd", "second:cmd"]);
    }

    #[test]
    fn test_failure_callbacks() {
        let log: Log = Arc::default();
        let mut tree = CommandTree::default();
        let id = tree
            .build(
                CommandBuilder::new("cmd")
                    .processor(|ctx| {
                        ctx.mark_failed();
                        Ok(())
                    })
                    .callback(CallbackKind::Success, recorder(&log, "success"))
                    .callback(CallbackKind::Failure, recorder(&log, "failure")),
            )
            .unwrap();

        let ctx = tree.run(id, &[] as &[&str]).unwrap().unwrap();
        assert!(ctx.is_failed());
        assert_eq!(*log.lock().unwrap(), ["failure:cmd"]);
    }

    #[test]
    fn test_stop_halts_chain_quietly() {
        let log: Log = Arc::default();
        let mut tree = CommandTree::default();
        let id = tree
            .build(
                CommandBuilder::new("cmd")
                    .processor(|ctx| {
                        ctx.stop();
                        Ok(())
                    })
                    .processor(|ctx| {
                        ctx.write("unreachable");
                        Ok(())
                    })
                    .callback(CallbackKind::Success, recorder(&log, "success"))
                    .callback(CallbackKind::Failure, recorder(&log, "failure")),
            )
            .unwrap();

        let ctx = tree.run(id, &[] as &[&str]).unwrap().unwrap();
        assert!(ctx.is_stopped());
        assert!(ctx.output().is_empty());
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_processor_error_propagates_after_callbacks() {
        let log: Log = Arc::default();
        let mut tree = CommandTree::default();
        let outer = tree.build(CommandBuilder::new("outer").parent(CommandTree::GLOBAL)).unwrap();
        tree.build(
            CommandBuilder::new("inner")
                .parent(outer)
                .processor(|_| Err(anyhow::anyhow!("target not found")))
                .processor(|ctx| {
                    ctx.write("unreachable");
                    Ok(())
                })
                .callback(CallbackKind::Failure, recorder(&log, "failure")),
        )
        .unwrap();

        let err = tree.run(CommandTree::GLOBAL, &["outer", "inner"]).unwrap_err();
        match err {
            CommandError::Processor { command, source } => {
                assert_eq!(command, "outer.inner");
                assert_eq!(source.to_string(), "target not found");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*log.lock().unwrap(), ["failure:outer.inner"]);
    }

    #[test]
    fn test_preprocessor_veto() {
        let log: Log = Arc::default();
        let mut tree = CommandTree::default();
        let id = tree
            .build(
                marking("guarded", CommandTree::GLOBAL)
                    .preprocessor(|tokens| tokens.first() != Some(&"deny"))
                    .callback(CallbackKind::Success, recorder(&log, "success")),
            )
            .unwrap();

        assert!(tree.run(id, &["deny"]).unwrap().is_none());
        assert!(log.lock().unwrap().is_empty());
        assert!(tree.run(id, &["allow"]).unwrap().is_some());
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_options_and_arguments() {
        let mut tree = CommandTree::default();
        let id = tree
            .build(
                CommandBuilder::new("spawn")
                    .option(Arg::new("count").long("count").short('n').value_parser(clap::value_parser!(u32)))
                    .option(Arg::new("silent").long("silent").action(ArgAction::SetTrue))
                    .processor(|ctx| {
                        let count = ctx.options().get::<u32>("count").copied().unwrap_or(1);
                        let line = format!("{} x{} silent={}", ctx.join(" "), count, ctx.options().has("silent"));
                        ctx.write(line);
                        Ok(())
                    }),
            )
            .unwrap();

        let ctx = tree.run(id, &["zombie", "-n", "3", "--silent"]).unwrap().unwrap();
        assert_eq!(ctx.output(), ["zombie x3 silent=true"]);
        // Processors ran, so pending was promoted
        assert_eq!(ctx.state(), ExecuteState::Success);

        let err = tree.run(id, &["--count"]).unwrap_err();
        assert!(matches!(err, CommandError::Options { .. }));
    }

    #[test]
    fn test_required_args() {
        let mut tree = CommandTree::default();
        let id = tree.build(marking("bind", CommandTree::GLOBAL).required_args(2)).unwrap();

        let ctx = tree.run(id, &["F1"]).unwrap().unwrap();
        assert!(ctx.is_failed());
        assert!(ctx.output()[0].contains("requires 2"));

        let ctx = tree.run(id, &["F1", "noclip"]).unwrap().unwrap();
        assert_eq!(ctx.state(), ExecuteState::Success);
    }

    #[test]
    fn test_node_without_work_stays_pending() {
        let log: Log = Arc::default();
        let mut tree = CommandTree::default();
        let id = tree
            .build(
                CommandBuilder::new("group")
                    .callback(CallbackKind::Success, recorder(&log, "success")),
            )
            .unwrap();

        let ctx = tree.run(id, &[] as &[&str]).unwrap().unwrap();
        assert_eq!(ctx.state(), ExecuteState::Pending);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_setting_get_and_set() {
        let mut tree = CommandTree::default();
        let aim = tree.build(CommandBuilder::new("aim").parent(CommandTree::GLOBAL)).unwrap();
        let fov = tree
            .build(
                CommandBuilder::new("fov")
                    .parent(aim)
                    .setting(Setting::new(90i32).min(10).max(170)),
            )
            .unwrap();

        let ctx = tree.run(CommandTree::GLOBAL, &["aim", "fov"]).unwrap().unwrap();
        assert_eq!(ctx.output(), ["aim.fov = 90"]);
        assert_eq!(ctx.state(), ExecuteState::Success);

        let ctx = tree.run(CommandTree::GLOBAL, &["aim", "fov", "400"]).unwrap().unwrap();
        assert_eq!(ctx.output(), ["aim.fov = 170"]);
        assert_eq!(tree.setting::<i32>(fov), Some(170));

        let ctx = tree.run(fov, &["wide"]).unwrap().unwrap();
        assert!(ctx.is_failed());
        assert_eq!(ctx.output(), ["Invalid value 'wide' for aim.fov", "aim.fov = 170"]);
    }
}
