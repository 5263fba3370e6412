//! Diesel schema definitions for the ImuneTrack tables.

diesel::table! {
    vacinas (id) {
        id -> Int4,
        #[max_length = 100]
        nome -> Varchar,
        doses -> Int4,
    }
}

diesel::table! {
    historico_vacinal (id) {
        id -> Int4,
        usuario_id -> Int4,
        vacina_id -> Int4,
        numero_dose -> Int4,
        #[max_length = 20]
        status -> Varchar,
        data_aplicacao -> Nullable<Date>,
        data_prevista -> Nullable<Date>,
        #[max_length = 50]
        lote -> Nullable<Varchar>,
        #[max_length = 100]
        local_aplicacao -> Nullable<Varchar>,
        #[max_length = 100]
        profissional -> Nullable<Varchar>,
        observacoes -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(historico_vacinal -> vacinas (vacina_id));

diesel::allow_tables_to_appear_in_same_query!(historico_vacinal, vacinas);
