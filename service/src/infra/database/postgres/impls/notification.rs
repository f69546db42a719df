//! [`Notification`]-related [`Database`] implementations.

use common::operations::Insert;
use tracerr::Traced;

use crate::{
    domain::Notification,
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Insert<Notification>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(notification): Insert<Notification>,
    ) -> Result<Self::Ok, Self::Err> {
        let Notification {
            id,
            kind,
            agreement_id,
            recipient_id,
            recipient_email,
            listing_title,
            host_name,
            guest_name,
            signer_name,
            created_at,
        } = notification;

        const SQL: &str = "\
            INSERT INTO notifications (\
                id, kind, agreement_id, \
                recipient_id, recipient_email, \
                listing_title, host_name, guest_name, signer_name, \
                created_at\
            ) \
            VALUES (\
                $1::UUID, $2::INT2, $3::UUID, \
                $4::UUID, $5::VARCHAR, \
                $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, $9::VARCHAR, \
                $10::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &kind,
                &agreement_id,
                &recipient_id,
                &recipient_email,
                &listing_title,
                &host_name,
                &guest_name,
                &signer_name,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
