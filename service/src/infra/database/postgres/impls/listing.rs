//! [`Listing`]-related [`Database`] implementations.

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    domain::{listing, Listing},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Listing>, listing::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Listing>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Listing>, listing::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id: listing::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, owner_id, title, kind, city, region, description, \
                   price \
            FROM listings \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Listing {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                title: row.get("title"),
                kind: row.get("kind"),
                city: row.get("city"),
                region: row.get("region"),
                description: row.get("description"),
                price: row.get("price"),
            }))
    }
}
