//! A mock database session driven through the scoped cleanup chain.
//!
//! Run with: cargo run --example database_session

use std::fmt;
use std::sync::Arc;

use ebbtide::{run_scoped, Fault, Release, Scope};

#[derive(Debug)]
struct NoSuchTable(String);

impl fmt::Display for NoSuchTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no such table: {}", self.0)
    }
}

impl std::error::Error for NoSuchTable {}

struct Connection;

impl Connection {
    fn connect(scope: &Scope) -> Arc<Connection> {
        println!("connecting");
        scope.register(Connection)
    }

    fn prepare(&self, scope: &Scope, sql: &str) -> Arc<Statement> {
        println!("preparing: {}", sql);
        scope.register(Statement {
            sql: sql.to_string(),
        })
    }
}

impl Release for Connection {
    fn release(&self) -> Result<(), Fault> {
        println!("closing connection");
        Ok(())
    }
}

struct Statement {
    sql: String,
}

impl Statement {
    fn execute(&self) -> Result<(), Fault> {
        if self.sql.contains("missing") {
            Err(Fault::new(NoSuchTable("missing".to_string())))
        } else {
            Ok(())
        }
    }
}

impl Release for Statement {
    fn release(&self) -> Result<(), Fault> {
        println!("closing statement: {}", self.sql);
        Ok(())
    }
}

fn main() {
    // A query against a table that exists: nothing to recover from.
    run_scoped(|scope| {
        let conn = Connection::connect(scope);
        let stmt = conn.prepare(scope, "select * from users");
        stmt.execute()
    })
    .finally(|| {
        println!("session done");
        Ok(())
    })
    .expect("clean session must not fault");

    println!();

    // A query against a missing table: the typed catch absorbs the fault,
    // and the connection and statement are still released, in the order
    // they were registered.
    run_scoped(|scope| {
        let conn = Connection::connect(scope);
        let stmt = conn.prepare(scope, "select * from missing");
        stmt.execute()
    })
    .catch(|err: &NoSuchTable| {
        println!("recovered: {}", err);
        Ok(())
    })
    .finally(|| {
        println!("session done");
        Ok(())
    })
    .expect("the catch handled the fault");
}
