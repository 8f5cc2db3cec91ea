//! Parameterized scripts rendered into a session directory. Template
//! sources are compiled into the binary with `include_str!`; `minijinja`
//! renders Python source from them instead of wire payloads.

use minijinja::{context, Environment};

use crate::error::SessionError;

const BOOTSTRAP_SOURCE: &str = include_str!("../templates/bootstrap.py.jinja");
const ATTACH_PDB_SOURCE: &str = include_str!("../templates/attach_pdb.py.jinja");

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_template("bootstrap.py", BOOTSTRAP_SOURCE).expect("bootstrap template is valid");
    env.add_template("attach_pdb.py", ATTACH_PDB_SOURCE).expect("attach_pdb template is valid");
    env
}

/// Renders the bootstrap script materialized into every session directory.
/// Takes no parameters: the script computes its own socket path from
/// `__file__` once it is running inside the debugger.
pub fn render_bootstrap() -> Result<String, SessionError> {
    let env = environment();
    let tmpl = env.get_template("bootstrap.py").expect("registered above");
    tmpl.render(context! {}).map_err(|e| SessionError::Template("bootstrap.py", e))
}

/// Renders the interactive-attach script for a chosen debugger (only
/// `pdb` is supported today), parameterized by the bridge socket path.
pub fn render_attach(debugger: &str, unix_socket_path: &str) -> Result<String, SessionError> {
    if debugger != "pdb" {
        return Err(SessionError::Template(
            "attach_pdb.py",
            minijinja::Error::new(
                minijinja::ErrorKind::InvalidOperation,
                format!("no attach template registered for debugger {debugger:?}"),
            ),
        ));
    }
    let env = environment();
    let tmpl = env.get_template("attach_pdb.py").expect("registered above");
    tmpl.render(context! { unix_socket_path })
        .map_err(|e| SessionError::Template("attach_pdb.py", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_renders_without_jinja_leftovers() {
        let rendered = render_bootstrap().unwrap();
        assert!(rendered.contains("def main():"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn attach_pdb_embeds_the_socket_path() {
        let rendered = render_attach("pdb", "/tmp/injectd_dbg_xyz/proc.sock").unwrap();
        assert!(rendered.contains("/tmp/injectd_dbg_xyz/proc.sock"));
    }

    #[test]
    fn unknown_debugger_is_rejected() {
        assert!(render_attach("lldb", "/tmp/x.sock").is_err());
    }
}
