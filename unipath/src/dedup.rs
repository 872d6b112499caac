//! Compacting the candidate list.
//!
//! Entries are dropped when they are empty, when they fail to
//! stat, or when an earlier entry already named the same
//! directory. Sameness is decided by (device, inode) identity,
//! not by string comparison, so symlinked and bind-mounted
//! aliases of a directory collapse too.

use std::path::PathBuf;

use tracing::debug;
use tracing::trace;

use uni_fs::DirIdentity;

/// Number of buckets in the identity index.
pub const BUCKETS: usize = 32;

/// How many identities one bucket can track.
pub const BUCKET_CAPACITY: usize = 128;

/// Bounded index of directory identities already emitted.
///
/// Geometry is fixed at construction: `buckets` slots, each able
/// to track `capacity` identities, with all storage allocated up
/// front. Bucket selection is `inode mod buckets`. Once a bucket
/// is full it stops recording; directories hashing into it are
/// then kept in the output even when they duplicate an earlier
/// entry.
#[ derive( Debug ) ]
pub struct DedupIndex {
    buckets: Box<[ Vec<DirIdentity> ]>,
    capacity: usize,
}

impl DedupIndex {
    #[ must_use ]
    pub fn new() -> Self {
        Self::with_geometry( BUCKETS, BUCKET_CAPACITY )
    }

    /// An index with custom geometry. Mostly interesting for
    /// exercising the degradation behavior with tiny buckets.
    #[ must_use ]
    pub fn with_geometry( buckets: usize, capacity: usize ) -> Self {
        assert!( buckets > 0, "Bucket count must be nonzero" );
        let buckets = std::iter::repeat_with( || Vec::with_capacity( capacity ) )
            .take( buckets )
            .collect();
        Self { buckets, capacity }
    }

    /// Probe and record in one step. Returns true when `id` was
    /// already recorded, meaning the caller should drop its
    /// entry. Records `id` only while its bucket has room.
    pub fn seen_before( &mut self, id: DirIdentity ) -> bool {
        let slot = ( id.ino() % self.buckets.len() as u64 ) as usize;
        let Some( bucket ) = self.buckets.get_mut( slot ) else {
            // ino mod len is always in range
            return false;
        };

        if bucket.contains( &id ) {
            return true;
        }
        if bucket.len() < self.capacity {
            bucket.push( id );
        } else {
            trace!( slot, "bucket full, identity not recorded" );
        }
        false
    }
}

impl Default for DedupIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Compact `dirs` in place: drop empty entries, entries that fail
/// to stat, and entries whose identity was seen earlier in the
/// walk. The first occurrence wins and relative order is
/// preserved. Entries only move backwards, into the gap earlier
/// drops opened.
#[ tracing::instrument( skip_all ) ]
pub fn dedup_in_place( dirs: &mut Vec<PathBuf>, index: &mut DedupIndex ) {
    dirs.retain( |dir| {
        if dir.as_os_str().is_empty() {
            trace!( "skip empty entry" );
            return false;
        }
        let id = match DirIdentity::of( dir ) {
            Ok( id ) => id,
            Err( err ) => {
                trace!( ?dir, %err, "drop entry that does not stat" );
                return false;
            }
        };
        let duplicate = index.seen_before( id );
        if duplicate {
            debug!( ?dir, "drop duplicate" );
        }
        !duplicate
    } );
}

#[ cfg( test ) ]
#[ allow( clippy::unwrap_used ) ]
mod test {

    use std::os::unix::fs::symlink;

    use super::*;

    use assert_fs::TempDir;
    use assert_fs::fixture::ChildPath;
    use assert_fs::prelude::*;

    macro_rules! make_tempdir {
        () => { {
            TempDir::new().expect( "Failed to setup tempdir" )
        } };
    }

    fn dir( top: &TempDir, name: &str ) -> ChildPath {
        let child = top.child( name );
        child.create_dir_all().unwrap();
        child
    }

    fn run_default( dirs: &mut Vec<PathBuf> ) {
        let mut index = DedupIndex::new();
        dedup_in_place( dirs, &mut index );
    }

    #[ test ]
    fn distinct_dirs_pass_through_in_order() {
        let top = make_tempdir!();
        let ( a, b, c ) =
            ( dir( &top, "a" ), dir( &top, "b" ), dir( &top, "c" ) );

        let input = vec![
            b.path().to_owned(),
            a.path().to_owned(),
            c.path().to_owned(),
        ];
        let mut dirs = input.clone();
        run_default( &mut dirs );

        assert_eq!( dirs, input );
    }

    #[ test ]
    fn string_duplicates_collapse_to_first() {
        let top = make_tempdir!();
        let ( a, b ) = ( dir( &top, "a" ), dir( &top, "b" ) );
        let missing = top.child( "missing" );

        // the "/a:/b:/a:/c" shape
        let mut dirs = vec![
            a.path().to_owned(),
            b.path().to_owned(),
            a.path().to_owned(),
            missing.path().to_owned(),
        ];
        run_default( &mut dirs );

        assert_eq!( dirs, [ a.path().to_owned(), b.path().to_owned() ] );
    }

    #[ test ]
    fn symlink_alias_is_a_duplicate() {
        let top = make_tempdir!();
        let real = dir( &top, "real" );
        let alias = top.child( "alias" );
        symlink( real.path(), alias.path() ).unwrap();

        let mut dirs = vec![ real.path().to_owned(), alias.path().to_owned() ];
        run_default( &mut dirs );

        assert_eq!( dirs, [ real.path().to_owned() ] );
    }

    #[ test ]
    fn empty_entries_are_skipped() {
        let top = make_tempdir!();
        let ( a, b ) = ( dir( &top, "a" ), dir( &top, "b" ) );

        // the "/a::/b" shape
        let mut dirs = vec![
            a.path().to_owned(),
            PathBuf::new(),
            b.path().to_owned(),
        ];
        run_default( &mut dirs );

        assert_eq!( dirs, [ a.path().to_owned(), b.path().to_owned() ] );
    }

    #[ test ]
    fn missing_dirs_are_dropped_anywhere() {
        let top = make_tempdir!();
        let a = dir( &top, "a" );
        let missing = top.child( "missing" );

        let mut dirs = vec![
            missing.path().to_owned(),
            a.path().to_owned(),
            missing.path().to_owned(),
        ];
        run_default( &mut dirs );

        assert_eq!( dirs, [ a.path().to_owned() ] );
    }

    #[ test ]
    fn deduplication_is_idempotent() {
        let top = make_tempdir!();
        let ( a, b ) = ( dir( &top, "a" ), dir( &top, "b" ) );
        let alias = top.child( "alias" );
        symlink( b.path(), alias.path() ).unwrap();

        let mut dirs = vec![
            a.path().to_owned(),
            b.path().to_owned(),
            alias.path().to_owned(),
            a.path().to_owned(),
        ];
        run_default( &mut dirs );
        let first_pass = dirs.clone();

        run_default( &mut dirs );
        assert_eq!( dirs, first_pass );
    }

    #[ test ]
    fn full_bucket_degrades_without_corruption() {
        let top = make_tempdir!();
        let ( a, b ) = ( dir( &top, "a" ), dir( &top, "b" ) );

        // a single one-slot bucket: `a` claims the slot, `b` can
        // no longer be recorded and its repeat leaks through
        let mut index = DedupIndex::with_geometry( 1, 1 );
        let mut dirs = vec![
            a.path().to_owned(),
            b.path().to_owned(),
            b.path().to_owned(),
            a.path().to_owned(),
        ];
        dedup_in_place( &mut dirs, &mut index );

        assert_eq! {
            dirs,
            [
                a.path().to_owned(),
                b.path().to_owned(),
                b.path().to_owned(),
            ]
        };
    }

    #[ test ]
    fn tracked_entries_still_deduplicate_at_capacity() {
        let top = make_tempdir!();
        let a = dir( &top, "a" );
        let b = dir( &top, "b" );
        let c = dir( &top, "c" );

        let mut index = DedupIndex::with_geometry( 1, 2 );
        let mut dirs = vec![
            a.path().to_owned(),
            b.path().to_owned(),
            c.path().to_owned(),
            a.path().to_owned(),
            b.path().to_owned(),
        ];
        dedup_in_place( &mut dirs, &mut index );

        // a and b fit in the bucket and stay unique, c was over
        // capacity
        assert_eq! {
            dirs,
            [
                a.path().to_owned(),
                b.path().to_owned(),
                c.path().to_owned(),
            ]
        };
    }
}
