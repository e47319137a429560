//! Installation hints for the vendor tools dbx shells out to.

/// Return human-readable installation instructions for `tool`.
pub fn install_hint(tool: &str) -> &'static str {
    match tool {
        "mysqldump" | "mysql" => {
            "MySQL client tools (Debian/Ubuntu: `sudo apt install -y mysql-client`, \
             macOS: `brew install mysql-client`, others: https://dev.mysql.com/downloads/)"
        }
        "pg_dump" | "pg_restore" | "psql" => {
            "PostgreSQL client tools (Debian/Ubuntu: `sudo apt install -y postgresql-client`, \
             RHEL/CentOS: `sudo yum install -y postgresql`, macOS: `brew install postgresql`, \
             Windows: add the PostgreSQL bin folder to PATH)"
        }
        "mongodump" | "mongorestore" => {
            "MongoDB Database Tools (Debian/Ubuntu: `sudo apt install -y mongodb-database-tools`, \
             macOS: `brew install mongodb-database-tools`, \
             others: https://www.mongodb.com/docs/database-tools/installation/)"
        }
        "mongosh" | "mongo" => "MongoDB Shell: https://www.mongodb.com/docs/mongodb-shell/install/",
        "aws" => "AWS CLI: https://docs.aws.amazon.com/cli/latest/userguide/getting-started-install.html",
        "gsutil" => "gsutil: https://cloud.google.com/storage/docs/gsutil_install",
        "az" => "Azure CLI: https://docs.microsoft.com/en-us/cli/azure/install-azure-cli",
        _ => "install it and make sure it is on PATH",
    }
}
