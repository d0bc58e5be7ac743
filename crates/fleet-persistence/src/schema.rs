//! Esquema Diesel (escrito a mano). Reemplazable con `diesel print-schema`.

diesel::table! {
    vehicle_workflows (id) {
        id -> Uuid,
        vehicle_id -> Text,
        aggregate_status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    workflow_steps (id) {
        id -> Uuid,
        workflow_id -> Uuid,
        kind -> Text,
        status -> Text,
        comment -> Nullable<Text>,
        validator_name -> Nullable<Text>,
        validator_role -> Nullable<Text>,
        validated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    workflow_audit_log (seq) {
        seq -> BigInt,
        id -> Uuid,
        workflow_id -> Uuid,
        step_kind -> Text,
        previous_status -> Text,
        new_status -> Text,
        comment -> Text,
        actor_name -> Text,
        actor_role -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(workflow_steps -> vehicle_workflows (workflow_id));
diesel::joinable!(workflow_audit_log -> vehicle_workflows (workflow_id));

diesel::allow_tables_to_appear_in_same_query!(vehicle_workflows, workflow_steps, workflow_audit_log,);
