mod candidates;
mod dedup;
mod resolve;

use std::ffi::OsString;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;

use anyhow::Context;
use anyhow::Result as AnyResult;
use anyhow::bail;
use tap::Pipe;
use tracing::debug;
use tracing::trace;

/// Exit code when the command could not be executed after it was
/// located. Distinct from plain lookup failures, which exit 1.
const EXEC_FAILURE_CODE: i32 = 2;

const COPYING_NOTICE: &str = "\
unipath - search path unification utility

This program is free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <https://www.gnu.org/licenses/>.";

const WARRANTY_NOTICE: &str = "\
This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.";

/// Unify the search path, then run or complete a command against it.
///
/// The inherited search path is extended with every conventional
/// bin directory of the system and of the home directories, then
/// directories that do not exist are removed along with
/// duplicates, where two directories are duplicates when they
/// resolve to the same device and inode. The command is looked up
/// in the cleaned path and executed with the cleaned path
/// installed in its environment.
#[ derive( clap::Parser, Debug ) ]
#[ command( max_term_width = 76 ) ]
struct CliOpts {
    /// Do not install the unified search path into the
    /// environment of the command.
    #[ arg( long, short ) ]
    preserve_env: bool,

    /// List executables whose name starts with PREFIX instead of
    /// running a command. `unipath - PREFIX` does the same.
    #[ arg( long, value_name = "PREFIX", conflicts_with = "print" ) ]
    complete: Option<String>,

    /// Print the unified search path and exit.
    #[ arg( long ) ]
    print: bool,

    /// Print licensing information and exit.
    #[ arg( long, short, alias = "copyright" ) ]
    copying: bool,

    /// Print the warranty disclaimer and exit.
    #[ arg( long, short ) ]
    warranty: bool,

    /// The command to run and its arguments.
    #[ arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND",
    ) ]
    command: Vec<OsString>,
}

fn main() {
    uni_tracing::init_tracing_subscriber();

    trace!( "Parse command line options" );
    let cliopts = <CliOpts as clap::Parser>::parse();

    if let Err( err ) = run( cliopts ) {
        eprintln!( "unipath: {err:?}" );
        std::process::exit( 1 );
    }
}

fn run( cliopts: CliOpts ) -> AnyResult<()> {
    debug!( ?cliopts );

    if cliopts.copying {
        println!( "{COPYING_NOTICE}" );
        return Ok(());
    }
    if cliopts.warranty {
        println!( "{WARRANTY_NOTICE}" );
        return Ok(());
    }

    let unified = unified_search_path()?;

    if cliopts.print {
        println!( "{}", join_for_env( &unified )?.to_string_lossy() );
        return Ok(());
    }

    if let Some( partial ) = completion_request( &cliopts )? {
        for name in resolve::complete_command( &unified, &partial ) {
            println!( "{name}" );
        }
        return Ok(());
    }

    execute( &cliopts, &unified )
}

/// Build the candidate list from the environment and the user
/// database, then compact it.
#[ tracing::instrument ]
fn unified_search_path() -> AnyResult< Vec<PathBuf> > {
    let inherited = std::env::var_os( "PATH" );
    let apparent_home = std::env::var_os( "HOME" ).map( PathBuf::from );
    let real_home = real_home();

    debug!( ?inherited, ?apparent_home, ?real_home );

    let mut dirs = candidates::build_candidates(
        inherited.as_deref(),
        apparent_home.as_deref(),
        real_home.as_deref(),
    )?;

    let mut index = dedup::DedupIndex::new();
    dedup::dedup_in_place( &mut dirs, &mut index );

    trace!( ?dirs, "unified search path" );

    Ok( dirs )
}

/// The home directory the user database records for the current
/// effective uid. May differ from `$HOME`, e.g. under privilege
/// elevation.
fn real_home() -> Option<PathBuf> {
    use nix::unistd::Uid;
    use nix::unistd::User;

    User::from_uid( Uid::effective() )
        .ok()
        .flatten()
        .map( |user| user.dir )
}

/// The completion prefix, when this invocation asks for
/// completion, either spelled `--complete PREFIX` or as the bare
/// `- PREFIX` form.
fn completion_request( cliopts: &CliOpts ) -> AnyResult< Option<String> > {
    if let Some( partial ) = &cliopts.complete {
        anyhow::ensure! { cliopts.command.is_empty(),
            "--complete does not take a command"
        };
        return Some( partial.clone() ).pipe( Ok );
    }

    match cliopts.command.as_slice() {
        [ dash, partial ] if dash.as_os_str() == "-" => {
            Some( partial.to_string_lossy().into_owned() ).pipe( Ok )
        },
        [ dash, .. ] if dash.as_os_str() == "-" => {
            bail!( r#"The "-" completion form takes exactly one name prefix"# )
        },
        _ => Ok( None ),
    }
}

fn join_for_env( unified: &[PathBuf] ) -> AnyResult<OsString> {
    std::env::join_paths( unified )
        .context( "A search path entry contains a separator" )?
        .pipe( Ok )
}

/// Find the command, install the unified path unless told not to,
/// and replace this process with it.
fn execute( cliopts: &CliOpts, unified: &[PathBuf] ) -> AnyResult<()> {
    let Some(( command, args )) = cliopts.command.split_first() else {
        bail!( "No command specified" );
    };

    let command_name = command.to_string_lossy();

    let file = resolve::find_command( unified, &command_name )
        .with_context( || format!( "Command not found: {command_name}" ) )?;

    if !cliopts.preserve_env {
        let joined = join_for_env( unified )?;
        debug!( ?joined, "install unified search path" );
        // SAFETY: this process is single threaded, nothing reads
        // the environment concurrently
        unsafe { std::env::set_var( "PATH", joined ); }
    }

    trace!( ?file, "replace the process image" );

    let err = Command::new( &file )
        .arg0( command )
        .args( args )
        .exec();

    // exec only returns on failure
    eprintln!( "unipath: failed to execute {}: {err}", file.display() );
    std::process::exit( EXEC_FAILURE_CODE );
}
