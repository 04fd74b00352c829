mod test_answer_failure_keeps_state;
